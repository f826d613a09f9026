//! `strand init`: project scaffolding.

use std::fs;
use std::path::{Path, PathBuf};
use strand_hdl::{
    Design, Direction, Instance, ModuleBody, ModuleDef, NetExpr, PortDecl,
};
use strand_source::Span;

pub fn run(name: Option<&str>, quiet: bool) -> Result<(), String> {
    let root = match name {
        Some(name) => {
            let dir = PathBuf::from(name);
            fs::create_dir_all(&dir).map_err(|e| e.to_string())?;
            dir
        }
        None => PathBuf::from("."),
    };
    let project = name.unwrap_or("strand-project");

    let config_path = root.join(strand_config::CONFIG_FILE);
    if config_path.exists() {
        return Err(format!("`{}` already exists", config_path.display()));
    }
    let config = format!(
        "[project]\nname = \"{project}\"\ndesign = \"design.json\"\ntop = \"half_adder\"\n\n[build]\nout_dir = \"build\"\n"
    );
    fs::write(&config_path, config).map_err(|e| e.to_string())?;

    let design_path = root.join("design.json");
    write_demo_design(&design_path)?;

    if !quiet {
        println!("created {}", config_path.display());
        println!("created {}", design_path.display());
        println!("next: `strand build`, then `strand run --set a=1 --set b=1`");
    }
    Ok(())
}

/// A half adder: the smallest design that exercises both derived gates.
fn write_demo_design(path: &Path) -> Result<(), String> {
    let port = |name: &str, dir, width| PortDecl {
        name: name.into(),
        dir,
        width,
        span: Span::DUMMY,
    };
    let conn = |formal: &str, net: &str| (formal.to_string(), NetExpr::Ref(net.into()));
    let design = Design {
        modules: vec![ModuleDef {
            name: "half_adder".into(),
            ports: vec![
                port("a", Direction::Input, 1),
                port("b", Direction::Input, 1),
                port("sum", Direction::Output, 1),
                port("carry", Direction::Output, 1),
            ],
            body: ModuleBody::Structural {
                wires: vec![],
                instances: vec![
                    Instance {
                        module: "xor".into(),
                        name: "x0".into(),
                        connections: vec![conn("a", "a"), conn("b", "b"), conn("y", "sum")],
                        span: Span::DUMMY,
                    },
                    Instance {
                        module: "and".into(),
                        name: "a0".into(),
                        connections: vec![conn("a", "a"), conn("b", "b"), conn("y", "carry")],
                        span: Span::DUMMY,
                    },
                ],
            },
            span: Span::DUMMY,
        }],
    };
    let json = serde_json::to_string_pretty(&design).map_err(|e| e.to_string())?;
    fs::write(path, json).map_err(|e| e.to_string())
}
