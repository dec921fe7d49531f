//! Hand-built Go syntax fragments
//!
//! Generated methods are assembled from these nodes rather than parsed from
//! text, so every fragment is well-formed by construction. Rendering follows
//! gofmt layout (tab indentation, `func (recv) Name(params) results {`).
//!
//! Only the slice of the Go grammar that the generator emits is modeled
//! here. Keep it in step with the grammar when adding new fragments.

use std::fmt;

use super::naming::is_go_identifier;
use crate::config::RuntimeConfig;

/// A Go identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident(String);

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Type expressions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Named(Ident),
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named(Ident::new(name))
    }

    pub fn pointer_to(inner: TypeExpr) -> Self {
        TypeExpr::Pointer(Box::new(inner))
    }

    pub fn slice_of(elem: TypeExpr) -> Self {
        TypeExpr::Slice(Box::new(elem))
    }

    /// The named type at the bottom of any pointer/slice wrappers
    pub fn base_name(&self) -> &Ident {
        match self {
            TypeExpr::Named(ident) => ident,
            TypeExpr::Pointer(inner) | TypeExpr::Slice(inner) => inner.base_name(),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named(ident) => write!(f, "{}", ident),
            TypeExpr::Pointer(inner) => write!(f, "*{}", inner),
            TypeExpr::Slice(elem) => write!(f, "[]{}", elem),
        }
    }
}

/// A parameter, result or receiver entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: Option<Ident>,
    pub ty: TypeExpr,
}

impl Param {
    pub fn named(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: Some(Ident::new(name)),
            ty,
        }
    }

    pub fn unnamed(ty: TypeExpr) -> Self {
        Self { name: None, ty }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} {}", name, self.ty),
            None => write!(f, "{}", self.ty),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Ident(Ident),
    Selector { base: Box<Expr>, sel: Ident },
    Call { func: Box<Expr>, args: Vec<Expr> },
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(Ident::new(name))
    }

    /// `pkg.Name`
    pub fn qualified(pkg: impl Into<String>, name: impl Into<String>) -> Self {
        Expr::Selector {
            base: Box::new(Expr::ident(pkg)),
            sel: Ident::new(name),
        }
    }

    pub fn call(func: Expr, args: Vec<Expr>) -> Self {
        Expr::Call {
            func: Box::new(func),
            args,
        }
    }

    fn idents<'a>(&'a self, acc: &mut Vec<&'a Ident>) {
        match self {
            Expr::Ident(ident) => acc.push(ident),
            Expr::Selector { base, sel } => {
                base.idents(acc);
                acc.push(sel);
            }
            Expr::Call { func, args } => {
                func.idents(acc);
                for arg in args {
                    arg.idents(acc);
                }
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(ident) => write!(f, "{}", ident),
            Expr::Selector { base, sel } => write!(f, "{}.{}", base, sel),
            Expr::Call { func, args } => {
                write!(f, "{}(", func)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Return(Vec<Expr>),
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Return(results) if results.is_empty() => f.write_str("return"),
            Stmt::Return(results) => {
                f.write_str("return ")?;
                for (i, expr) in results.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", expr)?;
                }
                Ok(())
            }
        }
    }
}

/// A function or method declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDecl {
    pub receiver: Option<Param>,
    pub name: Ident,
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    pub body: Vec<Stmt>,
}

impl FuncDecl {
    /// Receiver base type, `T` for `(m *T)`
    pub fn receiver_type_name(&self) -> Option<&str> {
        self.receiver.as_ref().map(|r| r.ty.base_name().as_str())
    }

    /// Check every identifier and the overall shape
    pub fn validate(&self) -> Result<(), String> {
        let mut idents = vec![&self.name];
        let params = self
            .receiver
            .iter()
            .chain(self.params.iter())
            .chain(self.results.iter());
        for param in params {
            idents.extend(param.name.iter());
            idents.push(param.ty.base_name());
        }
        for stmt in &self.body {
            match stmt {
                Stmt::Return(results) => {
                    for expr in results {
                        expr.idents(&mut idents);
                    }
                }
            }
        }

        if let Some(bad) = idents.iter().find(|i| !is_go_identifier(i.as_str())) {
            return Err(format!(
                "`{}` is not a valid Go identifier in func {}",
                bad, self.name
            ));
        }

        let named = self.results.iter().filter(|r| r.name.is_some()).count();
        if named != 0 && named != self.results.len() {
            return Err(format!("func {} mixes named and unnamed results", self.name));
        }

        if !self.results.is_empty() && self.body.is_empty() {
            return Err(format!("func {} is missing a return statement", self.name));
        }

        Ok(())
    }
}

impl fmt::Display for FuncDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("func ")?;
        if let Some(recv) = &self.receiver {
            write!(f, "({}) ", recv)?;
        }
        write!(f, "{}(", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", param)?;
        }
        f.write_str(")")?;

        match self.results.as_slice() {
            [] => {}
            [single] if single.name.is_none() => write!(f, " {}", single)?,
            results => {
                f.write_str(" (")?;
                for (i, result) in results.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", result)?;
                }
                f.write_str(")")?;
            }
        }

        f.write_str(" {\n")?;
        for stmt in &self.body {
            writeln!(f, "\t{}", stmt)?;
        }
        f.write_str("}")
    }
}

/// Build `func (m *T) MarshalJSON() ([]byte, error) { return protojson.Marshal(m) }`
/// with the names taken from the runtime configuration
pub fn marshal_json(type_name: &str, runtime: &RuntimeConfig) -> FuncDecl {
    FuncDecl {
        receiver: Some(Param::named(
            &runtime.receiver,
            TypeExpr::pointer_to(TypeExpr::named(type_name)),
        )),
        name: Ident::new(&runtime.method),
        params: Vec::new(),
        results: vec![
            Param::unnamed(TypeExpr::slice_of(TypeExpr::named("byte"))),
            Param::unnamed(TypeExpr::named("error")),
        ],
        body: vec![Stmt::Return(vec![Expr::call(
            Expr::qualified(&runtime.package, &runtime.entry_point),
            vec![Expr::ident(&runtime.receiver)],
        )])],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marshal_json_rendering() {
        let func = marshal_json("Request", &RuntimeConfig::default());
        assert_eq!(
            func.to_string(),
            "func (m *Request) MarshalJSON() ([]byte, error) {\n\treturn protojson.Marshal(m)\n}"
        );
        assert!(func.validate().is_ok());
    }

    #[test]
    fn test_marshal_json_shape() {
        let func = marshal_json("Request", &RuntimeConfig::default());
        let recv = func.receiver.as_ref().unwrap();
        assert_eq!(recv.ty, TypeExpr::pointer_to(TypeExpr::named("Request")));
        assert!(func.params.is_empty());
        assert_eq!(func.results.len(), 2);
        assert_eq!(func.results[0].ty.to_string(), "[]byte");
        assert_eq!(func.results[1].ty.to_string(), "error");
        assert_eq!(func.body.len(), 1);
        assert_eq!(func.receiver_type_name(), Some("Request"));
    }

    #[test]
    fn test_runtime_names_flow_into_fragment() {
        let func = marshal_json("Foo_Bar", &RuntimeConfig::jsonpb());
        assert_eq!(
            func.to_string(),
            "func (m *Foo_Bar) MarshalJSON() ([]byte, error) {\n\treturn jsonpb.Marshal(m)\n}"
        );
    }

    #[test]
    fn test_validate_rejects_bad_identifiers() {
        let runtime = RuntimeConfig {
            entry_point: "Marshal-JSON".to_string(),
            ..RuntimeConfig::default()
        };
        let err = marshal_json("T", &runtime).validate().unwrap_err();
        assert!(err.contains("Marshal-JSON"));

        let keyword = marshal_json("type", &RuntimeConfig::default());
        assert!(keyword.validate().is_err());
    }

    #[test]
    fn test_validate_requires_return() {
        let mut func = marshal_json("T", &RuntimeConfig::default());
        func.body.clear();
        assert!(func.validate().is_err());
    }

    #[test]
    fn test_single_and_named_results() {
        let func = FuncDecl {
            receiver: None,
            name: Ident::new("f"),
            params: vec![Param::named("x", TypeExpr::named("int"))],
            results: vec![Param::unnamed(TypeExpr::named("error"))],
            body: vec![Stmt::Return(vec![Expr::ident("nil")])],
        };
        assert_eq!(
            func.to_string(),
            "func f(x int) error {\n\treturn nil\n}"
        );

        let named = FuncDecl {
            results: vec![Param::named("err", TypeExpr::named("error"))],
            body: vec![Stmt::Return(Vec::new())],
            ..func
        };
        assert_eq!(
            named.to_string(),
            "func f(x int) (err error) {\n\treturn\n}"
        );
    }
}
