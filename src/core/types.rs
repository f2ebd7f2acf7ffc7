// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Type descriptors – the classes and interfaces that can be proxied.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use once_cell::sync::OnceCell;
use uuid::Uuid;

use super::{ProxyError, Value, ValueType};
use crate::proxy::Instance;

/// Body of a method: receives the receiver and the call arguments.
pub type MethodBody = Arc<dyn Fn(&Instance, &[Value]) -> Result<Value, ProxyError> + Send + Sync>;

/// Body of a constructor: initializes the fields of a fresh instance.
pub type ConstructorBody = Arc<dyn Fn(&Instance, &[Value]) -> Result<(), ProxyError> + Send + Sync>;

/// Kind of a target type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A class with (possibly inherited) method bodies
    Class,
    /// An interface; methods without a body are abstract
    Interface,
    /// A primitive value type, never proxyable
    Primitive,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Class => write!(f, "class"),
            TypeKind::Interface => write!(f, "interface"),
            TypeKind::Primitive => write!(f, "primitive"),
        }
    }
}

/// Member visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Package,
    Private,
}

/// Name plus parameter types: the identity used for overriding and matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    pub name: String,
    pub params: Vec<ValueType>,
}

impl MethodSignature {
    pub fn new(name: &str, params: Vec<ValueType>) -> Self {
        Self {
            name: name.to_string(),
            params,
        }
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
        write!(f, "{}({})", self.name, params.join(", "))
    }
}

/// A method declared by a target type.
#[derive(Clone)]
pub struct MethodDescriptor {
    pub signature: MethodSignature,
    pub return_type: ValueType,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    /// Name of the type that declares this method (set when added to a type)
    pub declaring_type: String,
    body: Option<MethodBody>,
}

impl MethodDescriptor {
    /// Create an abstract public method.
    pub fn new(name: &str, params: Vec<ValueType>, return_type: ValueType) -> Self {
        Self {
            signature: MethodSignature::new(name, params),
            return_type,
            visibility: Visibility::Public,
            is_static: false,
            is_final: false,
            declaring_type: String::new(),
            body: None,
        }
    }

    /// Attach the original behavior of this method.
    pub fn with_body<F>(mut self, body: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> Result<Value, ProxyError> + Send + Sync + 'static,
    {
        self.body = Some(Arc::new(body));
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_final(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn params(&self) -> &[ValueType] {
        &self.signature.params
    }

    /// The original body, `None` for abstract methods.
    pub fn body(&self) -> Option<&MethodBody> {
        self.body.as_ref()
    }

    pub fn is_abstract(&self) -> bool {
        self.body.is_none()
    }

    /// Check call arguments against the declared parameters.
    pub fn check_args(&self, args: &[Value]) -> Result<(), ProxyError> {
        if args.len() != self.params().len() {
            return Err(ProxyError::ArgumentMismatch {
                method: self.signature.to_string(),
                reason: format!("expected {} arguments, got {}", self.params().len(), args.len()),
            });
        }
        for (idx, (param, arg)) in self.params().iter().zip(args).enumerate() {
            if !param.accepts(arg) {
                return Err(ProxyError::ArgumentMismatch {
                    method: self.signature.to_string(),
                    reason: format!("argument {idx} is {}, expected {param}", ValueType::of(arg)),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("signature", &self.signature.to_string())
            .field("return_type", &self.return_type)
            .field("visibility", &self.visibility)
            .field("is_static", &self.is_static)
            .field("is_final", &self.is_final)
            .field("declaring_type", &self.declaring_type)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// A constructor shape declared by a class.
#[derive(Clone)]
pub struct ConstructorDescriptor {
    pub params: Vec<ValueType>,
    pub visibility: Visibility,
    init: Option<ConstructorBody>,
}

impl ConstructorDescriptor {
    /// A constructor that accepts the given parameters and initializes nothing.
    pub fn new(params: Vec<ValueType>) -> Self {
        Self {
            params,
            visibility: Visibility::Public,
            init: None,
        }
    }

    /// The implicit no-argument constructor.
    pub fn no_args() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_init<F>(mut self, init: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> Result<(), ProxyError> + Send + Sync + 'static,
    {
        self.init = Some(Arc::new(init));
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn init(&self) -> Option<&ConstructorBody> {
        self.init.as_ref()
    }

    pub fn accepts(&self, args: &[Value]) -> bool {
        ValueType::accepts_all(&self.params, args)
    }
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("params", &self.params)
            .field("visibility", &self.visibility)
            .field("has_init", &self.init.is_some())
            .finish()
    }
}

#[derive(Debug)]
struct TypeDef {
    id: Uuid,
    name: String,
    kind: TypeKind,
    is_final: bool,
    is_sealed: bool,
    is_abstract: bool,
    superclass: Option<TargetType>,
    interfaces: Vec<TargetType>,
    methods: Vec<Arc<MethodDescriptor>>,
    constructors: Vec<Arc<ConstructorDescriptor>>,
    /// Lookup results, filled on first use
    instance_methods: OnceCell<Arc<Vec<Arc<MethodDescriptor>>>>,
}

/// Shared handle to an immutable class or interface definition.
///
/// Identity is the id assigned by [`TypeBuilder::build`]; two builds of the
/// same name are different types.
#[derive(Debug, Clone)]
pub struct TargetType {
    def: Arc<TypeDef>,
}

impl TargetType {
    pub fn id(&self) -> Uuid {
        self.def.id
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn kind(&self) -> TypeKind {
        self.def.kind
    }

    pub fn is_interface(&self) -> bool {
        self.def.kind == TypeKind::Interface
    }

    pub fn is_final(&self) -> bool {
        self.def.is_final
    }

    pub fn is_sealed(&self) -> bool {
        self.def.is_sealed
    }

    pub fn is_abstract(&self) -> bool {
        self.def.is_abstract || self.is_interface()
    }

    pub fn superclass(&self) -> Option<&TargetType> {
        self.def.superclass.as_ref()
    }

    pub fn interfaces(&self) -> &[TargetType] {
        &self.def.interfaces
    }

    /// Methods declared directly by this type, in declaration order.
    pub fn declared_methods(&self) -> &[Arc<MethodDescriptor>] {
        &self.def.methods
    }

    pub fn declared_constructors(&self) -> &[Arc<ConstructorDescriptor>] {
        &self.def.constructors
    }

    pub(crate) fn instance_methods_memo(&self) -> &OnceCell<Arc<Vec<Arc<MethodDescriptor>>>> {
        &self.def.instance_methods
    }
}

impl PartialEq for TargetType {
    fn eq(&self, other: &Self) -> bool {
        self.def.id == other.def.id
    }
}

impl Eq for TargetType {}

impl Hash for TargetType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.def.id.hash(state);
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.def.kind, self.def.name)
    }
}

/// Builder for [`TargetType`].
#[derive(Debug)]
pub struct TypeBuilder {
    name: String,
    kind: TypeKind,
    is_final: bool,
    is_sealed: bool,
    is_abstract: bool,
    superclass: Option<TargetType>,
    interfaces: Vec<TargetType>,
    methods: Vec<MethodDescriptor>,
    constructors: Vec<ConstructorDescriptor>,
}

impl TypeBuilder {
    fn new(name: &str, kind: TypeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            is_final: false,
            is_sealed: false,
            is_abstract: false,
            superclass: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    pub fn class(name: &str) -> Self {
        Self::new(name, TypeKind::Class)
    }

    pub fn interface(name: &str) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    pub fn primitive(name: &str) -> Self {
        let mut builder = Self::new(name, TypeKind::Primitive);
        builder.is_final = true;
        builder
    }

    /// Forbid subclassing.
    pub fn mark_final(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// Restrict subclassing to a closed set of known types.
    pub fn mark_sealed(mut self) -> Self {
        self.is_sealed = true;
        self
    }

    pub fn mark_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn extends(mut self, superclass: &TargetType) -> Self {
        self.superclass = Some(superclass.clone());
        self
    }

    pub fn implements(mut self, interface: &TargetType) -> Self {
        self.interfaces.push(interface.clone());
        self
    }

    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    pub fn constructor(mut self, constructor: ConstructorDescriptor) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn build(self) -> TargetType {
        let name = self.name;
        let methods = self
            .methods
            .into_iter()
            .map(|mut m| {
                m.declaring_type = name.clone();
                Arc::new(m)
            })
            .collect();

        TargetType {
            def: Arc::new(TypeDef {
                id: Uuid::new_v4(),
                name,
                kind: self.kind,
                is_final: self.is_final,
                is_sealed: self.is_sealed,
                is_abstract: self.is_abstract,
                superclass: self.superclass,
                interfaces: self.interfaces,
                methods,
                constructors: self.constructors.into_iter().map(Arc::new).collect(),
                instance_methods: OnceCell::new(),
            }),
        }
    }
}
