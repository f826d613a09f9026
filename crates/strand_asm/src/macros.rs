//! Macro capture and textual expansion.
//!
//! `.macro NAME p1, p2 … / body / .endmacro` records the body lines
//! verbatim. An invocation substitutes `\p` references by the actual
//! argument tokens and feeds the resulting lines back through the normal
//! line processor, so macros expand before any label binding happens.

use std::collections::HashMap;

/// Maximum macro nesting depth before expansion is abandoned.
pub const MAX_DEPTH: u32 = 16;

/// One captured macro definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macro {
    /// The macro name, stored uppercase.
    pub name: String,
    /// Parameter names in declaration order.
    pub params: Vec<String>,
    /// Body lines, verbatim.
    pub body: Vec<String>,
}

impl Macro {
    /// Expands the body with `args` substituted for `\param` references.
    ///
    /// Returns an error when the argument count does not match.
    pub fn expand(&self, args: &[String]) -> Result<Vec<String>, String> {
        if args.len() != self.params.len() {
            return Err(format!(
                "macro `{}` takes {} argument(s), got {}",
                self.name,
                self.params.len(),
                args.len()
            ));
        }
        // Longer parameter names substitute first so `\count` is never
        // clobbered by a shorter `\c`.
        let mut order: Vec<usize> = (0..self.params.len()).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(self.params[i].len()));

        let mut lines = Vec::with_capacity(self.body.len());
        for line in &self.body {
            let mut expanded = line.clone();
            for &i in &order {
                let pattern = format!("\\{}", self.params[i]);
                expanded = expanded.replace(&pattern, &args[i]);
            }
            lines.push(expanded);
        }
        Ok(lines)
    }
}

/// The macro table of one assembly run, keyed by uppercase name.
#[derive(Debug, Default)]
pub struct MacroTable {
    macros: HashMap<String, Macro>,
}

impl MacroTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a definition, replacing any previous one with the name.
    pub fn define(&mut self, mac: Macro) {
        self.macros.insert(mac.name.clone(), mac);
    }

    /// Looks up a macro by (case-insensitive) name.
    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.macros.get(&name.to_ascii_uppercase())
    }
}

/// Parses the parameter list of a `.macro` directive line.
///
/// `rest` is everything after the directive word, e.g. `PUSH16 lo, hi`.
pub fn parse_header(rest: &str) -> Result<(String, Vec<String>), String> {
    let rest = rest.trim();
    let (name, params) = match rest.split_once(char::is_whitespace) {
        Some((name, params)) => (name, params),
        None if !rest.is_empty() => (rest, ""),
        None => return Err(".macro needs a name".to_string()),
    };
    let params: Vec<String> = params
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    Ok((name.to_ascii_uppercase(), params))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push16() -> Macro {
        Macro {
            name: "PUSH16".into(),
            params: vec!["val".into()],
            body: vec!["LDA #<\\val".into(), "PHA".into(), "LDA #>\\val".into(), "PHA".into()],
        }
    }

    #[test]
    fn expansion_substitutes_every_reference() {
        let lines = push16().expand(&["$1234".to_string()]).unwrap();
        assert_eq!(
            lines,
            vec!["LDA #<$1234", "PHA", "LDA #>$1234", "PHA"]
        );
    }

    #[test]
    fn wrong_arity_is_an_error() {
        assert!(push16().expand(&[]).is_err());
        assert!(push16()
            .expand(&["a".to_string(), "b".to_string()])
            .is_err());
    }

    #[test]
    fn longer_params_substitute_first() {
        let mac = Macro {
            name: "M".into(),
            params: vec!["a".into(), "ab".into()],
            body: vec![".byte \\ab, \\a".into()],
        };
        let lines = mac.expand(&["1".to_string(), "2".to_string()]).unwrap();
        assert_eq!(lines, vec![".byte 2, 1"]);
    }

    #[test]
    fn header_parsing() {
        let (name, params) = parse_header("delay count").unwrap();
        assert_eq!(name, "DELAY");
        assert_eq!(params, vec!["count"]);

        let (name, params) = parse_header("nopad").unwrap();
        assert_eq!(name, "NOPAD");
        assert!(params.is_empty());

        let (_, params) = parse_header("two a, b").unwrap();
        assert_eq!(params, vec!["a", "b"]);

        assert!(parse_header("").is_err());
    }

    #[test]
    fn table_is_case_insensitive_on_lookup() {
        let mut table = MacroTable::new();
        table.define(push16());
        assert!(table.get("push16").is_some());
        assert!(table.get("PUSH16").is_some());
        assert!(table.get("pop16").is_none());
    }
}
