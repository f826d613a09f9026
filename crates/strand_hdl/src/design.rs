//! Module definitions and the design database.

use crate::behavior::BehaviorBlock;
use crate::net::NetExpr;
use serde::{Deserialize, Serialize};
use strand_source::Span;

/// The direction of a module port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Driven by the instantiating context.
    Input,
    /// Driven by the module itself.
    Output,
}

/// A port declaration on a module definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortDecl {
    /// The port name.
    pub name: String,
    /// The port direction.
    pub dir: Direction,
    /// The port width in bits; multi-bit ports elaborate to ordered
    /// little-endian bit lists.
    pub width: u32,
    /// Source location of the declaration.
    #[serde(default = "Span::dummy")]
    pub span: Span,
}

/// An internal wire declaration inside a structural body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireDecl {
    /// The wire name.
    pub name: String,
    /// The wire width in bits.
    pub width: u32,
    /// Source location of the declaration.
    #[serde(default = "Span::dummy")]
    pub span: Span,
}

/// One instantiation of a module (or primitive) inside a structural body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// The name of the instantiated module definition.
    pub module: String,
    /// The instance name, used to build hierarchical signal names.
    pub name: String,
    /// Port connections: formal port name to actual net expression, in
    /// declaration order of the instantiating source.
    pub connections: Vec<(String, NetExpr)>,
    /// Source location of the instantiation.
    #[serde(default = "Span::dummy")]
    pub span: Span,
}

/// The body of a module definition.
///
/// Modules are polymorphic over structural and behavioral form; the
/// elaborator branches on this tag once per instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModuleBody {
    /// Sub-instances wired together with internal nets.
    Structural {
        /// Internal wire declarations.
        wires: Vec<WireDecl>,
        /// Instances in source order.
        instances: Vec<Instance>,
    },
    /// An imperative block evaluated as one atomic step per cycle.
    Behavioral(BehaviorBlock),
}

/// One module definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDef {
    /// The module name.
    pub name: String,
    /// Ports in declaration order.
    pub ports: Vec<PortDecl>,
    /// The module body.
    pub body: ModuleBody,
    /// Source location of the definition.
    #[serde(default = "Span::dummy")]
    pub span: Span,
}

impl ModuleDef {
    /// Looks up a port declaration by name.
    pub fn port(&self, name: &str) -> Option<&PortDecl> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Returns `true` if the body is behavioral.
    pub fn is_behavioral(&self) -> bool {
        matches!(self.body, ModuleBody::Behavioral(_))
    }
}

/// A database of module definitions, as produced by the parser front-end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Design {
    /// Module definitions in source order.
    pub modules: Vec<ModuleDef>,
}

impl Design {
    /// Creates an empty design.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a module definition by name.
    pub fn module(&self, name: &str) -> Option<&ModuleDef> {
        self.modules.iter().find(|m| m.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half_adder() -> ModuleDef {
        ModuleDef {
            name: "half_adder".into(),
            ports: vec![
                PortDecl {
                    name: "a".into(),
                    dir: Direction::Input,
                    width: 1,
                    span: Span::DUMMY,
                },
                PortDecl {
                    name: "b".into(),
                    dir: Direction::Input,
                    width: 1,
                    span: Span::DUMMY,
                },
                PortDecl {
                    name: "sum".into(),
                    dir: Direction::Output,
                    width: 1,
                    span: Span::DUMMY,
                },
                PortDecl {
                    name: "carry".into(),
                    dir: Direction::Output,
                    width: 1,
                    span: Span::DUMMY,
                },
            ],
            body: ModuleBody::Structural {
                wires: vec![],
                instances: vec![],
            },
            span: Span::DUMMY,
        }
    }

    #[test]
    fn port_lookup() {
        let m = half_adder();
        assert_eq!(m.port("carry").unwrap().dir, Direction::Output);
        assert!(m.port("cout").is_none());
    }

    #[test]
    fn design_lookup() {
        let d = Design {
            modules: vec![half_adder()],
        };
        assert!(d.module("half_adder").is_some());
        assert!(d.module("full_adder").is_none());
    }

    #[test]
    fn structural_is_not_behavioral() {
        assert!(!half_adder().is_behavioral());
    }

    #[test]
    fn serde_json_roundtrip() {
        let d = Design {
            modules: vec![half_adder()],
        };
        let json = serde_json::to_string(&d).unwrap();
        let back: Design = serde_json::from_str(&json).unwrap();
        assert_eq!(back.modules.len(), 1);
        assert_eq!(back.modules[0].ports.len(), 4);
    }
}
