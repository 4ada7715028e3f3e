/// Parser for shader parameter annotations
///
/// A parameter is declared by a line comment carrying the annotation tag,
/// followed by the declaration it describes:
///
/// ```text
/// // SHADER_PARAMETER [name=WorldViewProjection]
/// uniform mat4 u_wvp;
/// ```
///
/// The declaration's first word (after storage qualifiers) is the type and
/// its last word before `=`, `;` or `{` is the variable.

use crate::engine_warn;

/// Tag marking an annotation comment
pub const SHADER_PARAMETER_TAG: &str = "SHADER_PARAMETER";

const QUALIFIERS: [&str; 6] = ["uniform", "static", "const", "extern", "in", "out"];

/// One annotated shader parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderParameter {
    /// Semantic name from the `name` attribute
    pub name: String,
    /// Every `key=value` pair of the annotation, in order
    pub attributes: Vec<(String, String)>,
    /// Declared type (`mat4`, `sampler2D`, `float4x4`, ...)
    pub type_name: String,
    /// Declared variable
    pub variable: String,
}

impl ShaderParameter {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

pub struct ShaderParameterParser;

impl ShaderParameterParser {
    /// Every annotated parameter in `code`, in source order
    pub fn parse(code: &str) -> Vec<ShaderParameter> {
        let mut parameters = Vec::new();
        let mut lines = code.lines().peekable();

        while let Some(line) = lines.next() {
            let Some(attributes) = Self::parse_annotation(line) else {
                continue;
            };

            let Some(name) = attributes.iter().find(|(k, _)| k == "name").map(|(_, v)| v.clone()) else {
                engine_warn!("prism::ShaderParameterParser", "Annotation without name: {}", line.trim());
                continue;
            };

            // Declaration is the next line that is neither blank nor a comment
            let mut declaration = None;
            while let Some(&next) = lines.peek() {
                let trimmed = next.trim();
                if trimmed.is_empty() || (trimmed.starts_with("//") && !trimmed.contains(SHADER_PARAMETER_TAG)) {
                    lines.next();
                    continue;
                }
                if trimmed.starts_with("//") {
                    break;
                }
                declaration = lines.next();
                break;
            }

            match declaration.and_then(Self::parse_declaration) {
                Some((type_name, variable)) => parameters.push(ShaderParameter {
                    name,
                    attributes,
                    type_name,
                    variable,
                }),
                None => engine_warn!("prism::ShaderParameterParser",
                    "Annotation '{}' has no declaration", name),
            }
        }

        parameters
    }

    /// Whether any parameter has semantic `name`
    pub fn has_parameter(parameters: &[ShaderParameter], name: &str) -> bool {
        parameters.iter().any(|p| p.name == name)
    }

    /// `key=value` pairs of an annotation line, None if the line carries none
    fn parse_annotation(line: &str) -> Option<Vec<(String, String)>> {
        let comment = &line[line.find("//")? + 2..];
        let rest = &comment[comment.find(SHADER_PARAMETER_TAG)? + SHADER_PARAMETER_TAG.len()..];
        let open = rest.find('[')?;
        let close = rest[open..].find(']')? + open;

        let attributes = rest[open + 1..close]
            .split_whitespace()
            .filter_map(|pair| {
                let (key, value) = pair.split_once('=')?;
                Some((key.to_string(), value.to_string()))
            })
            .collect();
        Some(attributes)
    }

    /// (type, variable) of a declaration line
    fn parse_declaration(line: &str) -> Option<(String, String)> {
        let mut text = line.trim();
        if let Some(stripped) = text.strip_prefix("layout") {
            let close = stripped.find(')')?;
            text = stripped[close + 1..].trim_start();
        }

        // `:` ends HLSL declarations carrying a semantic or register binding
        let end = text.find(|c: char| matches!(c, '=' | ';' | '{' | ':')).unwrap_or(text.len());
        let words: Vec<&str> = text[..end]
            .split_whitespace()
            .filter(|word| !QUALIFIERS.contains(word))
            .collect();

        let (type_name, variable) = match words.as_slice() {
            [first, .., last] => (*first, *last),
            _ => return None,
        };
        let variable = variable.split('[').next().unwrap_or(variable);
        Some((type_name.to_string(), variable.to_string()))
    }
}

#[cfg(test)]
#[path = "shader_parameter_parser_tests.rs"]
mod tests;
