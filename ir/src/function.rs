use {
    crate::{arena::Ref, block::Block, intern::InternedString, types::Type},
    core::fmt::{self, Debug, Display, Formatter},
};

/// Formal parameter of a function
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Parameter {
    name: InternedString,
    typ: Type,
    function: Ref<Function>,
    index: usize,
}

impl Parameter {
    pub(crate) fn new(
        name: InternedString,
        typ: Type,
        function: Ref<Function>,
        index: usize,
    ) -> Self {
        Self {
            name,
            typ,
            function,
            index,
        }
    }

    pub fn name(&self) -> InternedString {
        self.name
    }

    pub fn typ(&self) -> Type {
        self.typ.clone()
    }

    /// Function owning this parameter
    pub fn function(&self) -> Ref<Function> {
        self.function
    }

    /// Position in the owning function's parameter list
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Display for Parameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "%{}: {}", self.name, self.typ)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Linkage {
    #[default]
    External,
    Internal,
}

/// Everything needed to create a function, minus its body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub return_type: Option<Type>,
    pub parameters: Vec<(InternedString, Type)>,
    pub linkage: Linkage,
    pub variadic: bool,
}

impl Signature {
    pub fn new(return_type: Option<Type>) -> Self {
        Self {
            return_type,
            ..Default::default()
        }
    }

    pub fn parameter<S: Into<InternedString>>(mut self, name: S, typ: Type) -> Self {
        self.parameters.push((name.into(), typ));
        self
    }

    pub fn linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }
}

#[derive(Clone, serde::Serialize, serde::Deserialize)]
pub struct Function {
    name: InternedString,
    return_type: Option<Type>,
    parameters: Vec<Ref<Parameter>>,
    blocks: Vec<Ref<Block>>,
    linkage: Linkage,
    variadic: bool,
}

impl Debug for Function {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Function {
    pub(crate) fn new(
        name: InternedString,
        return_type: Option<Type>,
        linkage: Linkage,
        variadic: bool,
    ) -> Self {
        Self {
            name,
            return_type,
            parameters: Vec::new(),
            blocks: Vec::new(),
            linkage,
            variadic,
        }
    }

    pub fn name(&self) -> InternedString {
        self.name
    }

    pub fn return_type(&self) -> Option<Type> {
        self.return_type.clone()
    }

    pub fn parameters(&self) -> &[Ref<Parameter>] {
        &self.parameters
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    pub(crate) fn push_parameter(&mut self, p: Ref<Parameter>) {
        self.parameters.push(p);
    }

    pub fn blocks(&self) -> &[Ref<Block>] {
        &self.blocks
    }

    pub(crate) fn push_block(&mut self, b: Ref<Block>) {
        self.blocks.push(b);
    }

    /// First block of the function, `None` for declarations
    pub fn entry_block(&self) -> Option<Ref<Block>> {
        self.blocks.first().copied()
    }

    /// A function without blocks has no body
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }
}
