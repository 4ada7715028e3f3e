/// Text resource descriptions
///
/// A document is a sequence of nodes. Each node is a name followed by one
/// value: a scalar token, a `[ ... ]` list of scalars, or a `{ ... }` block
/// of child nodes. `#` starts a comment running to the end of the line and
/// double quotes group a token containing whitespace.
///
/// ```text
/// FILETYPE MODEL
/// MESHES {
///     MESH {
///         NAME "quad"
///         INDICES [ 0 1 2 2 3 0 ]
///     }
/// }
/// ```

use std::str::FromStr;
use crate::error::{Error, Result};

/// Value attached to a node name
#[derive(Debug, Clone, PartialEq)]
pub enum TextValue {
    Scalar(String),
    List(Vec<String>),
    Block(Vec<TextNode>),
}

/// One `NAME value` pair
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub name: String,
    pub value: TextValue,
}

impl TextNode {
    /// Scalar value as text
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            TextValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Scalar value parsed as `T`
    pub fn parse<T: FromStr>(&self) -> Option<T> {
        self.as_str()?.parse().ok()
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match &self.value {
            TextValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Every list element parsed as `T`; None if any element fails
    pub fn parse_list<T: FromStr>(&self) -> Option<Vec<T>> {
        self.as_list()?.iter().map(|item| item.parse().ok()).collect()
    }

    pub fn children(&self) -> &[TextNode] {
        match &self.value {
            TextValue::Block(children) => children,
            _ => &[],
        }
    }

    /// First child called `name`
    pub fn child(&self, name: &str) -> Option<&TextNode> {
        self.children().iter().find(|node| node.name == name)
    }

    /// Every child called `name`, in order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a TextNode> + 'a {
        self.children().iter().filter(move |node| node.name == name)
    }
}

/// Parsed text document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextDocument {
    pub nodes: Vec<TextNode>,
}

impl TextDocument {
    pub fn parse(text: &str) -> Result<Self> {
        let tokens = tokenize(text)?;
        let mut parser = Parser { tokens, pos: 0 };
        let nodes = parser.parse_nodes(0)?;
        Ok(Self { nodes })
    }

    /// Parse raw bytes, rejecting invalid UTF-8
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|_| Error::InvalidResource("text resource is not valid UTF-8".to_string()))?;
        Self::parse(text)
    }

    pub fn node(&self, name: &str) -> Option<&TextNode> {
        self.nodes.iter().find(|node| node.name == name)
    }

    /// Value of the top-level `FILETYPE` node
    pub fn file_type(&self) -> Option<&str> {
        self.node("FILETYPE")?.as_str()
    }

    /// Fail unless `FILETYPE` equals `expected`
    pub fn expect_file_type(&self, expected: &str) -> Result<()> {
        match self.file_type() {
            Some(kind) if kind == expected => Ok(()),
            Some(kind) => Err(Error::InvalidResource(format!(
                "FILETYPE is {}, expected {}", kind, expected))),
            None => Err(Error::InvalidResource(format!("missing FILETYPE {}", expected))),
        }
    }
}

// ===== TOKENIZER =====

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Open(char),
    Close(char),
}

struct Located {
    token: Token,
    line: usize,
}

fn tokenize(text: &str) -> Result<Vec<Located>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1;

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '{' | '[' => {
                tokens.push(Located { token: Token::Open(c), line });
                chars.next();
            }
            '}' | ']' => {
                tokens.push(Located { token: Token::Close(c), line });
                chars.next();
            }
            '"' => {
                chars.next();
                let start_line = line;
                let mut word = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some(c) => {
                            if c == '\n' {
                                line += 1;
                            }
                            word.push(c);
                        }
                        None => {
                            return Err(Error::InvalidResource(format!(
                                "unterminated string starting on line {}", start_line)));
                        }
                    }
                }
                tokens.push(Located { token: Token::Word(word), line: start_line });
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '{' | '}' | '[' | ']' | '#' | '"') {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(Located { token: Token::Word(word), line });
            }
        }
    }

    Ok(tokens)
}

// ===== PARSER =====

/// Deepest `{ }` nesting accepted before the document is rejected
pub const MAX_DEPTH: usize = 64;

struct Parser {
    tokens: Vec<Located>,
    pos: usize,
}

impl Parser {
    fn next(&mut self) -> Option<&Located> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn last_line(&self) -> usize {
        self.tokens.last().map(|t| t.line).unwrap_or(1)
    }

    /// Nodes up to the `}` closing the block at `depth` (0 is the document)
    fn parse_nodes(&mut self, depth: usize) -> Result<Vec<TextNode>> {
        let in_block = depth > 0;
        let mut nodes = Vec::new();
        loop {
            let end_line = self.last_line();
            let (token, line) = match self.next() {
                Some(located) => (located.token.clone(), located.line),
                None if in_block => {
                    return Err(Error::InvalidResource(format!(
                        "unclosed block at end of input (line {})", end_line)));
                }
                None => return Ok(nodes),
            };

            let name = match token {
                Token::Word(name) => name,
                Token::Close('}') if in_block => return Ok(nodes),
                other => {
                    return Err(Error::InvalidResource(format!(
                        "expected a node name on line {}, found {:?}", line, other)));
                }
            };

            let value = self.parse_value(&name, line, depth)?;
            nodes.push(TextNode { name, value });
        }
    }

    fn parse_value(&mut self, name: &str, line: usize, depth: usize) -> Result<TextValue> {
        let token = self.next().map(|located| located.token.clone());
        match token {
            Some(Token::Word(word)) => Ok(TextValue::Scalar(word)),
            Some(Token::Open('{')) if depth >= MAX_DEPTH => Err(Error::InvalidResource(format!(
                "{} on line {} nests deeper than {} levels", name, line, MAX_DEPTH))),
            Some(Token::Open('{')) => Ok(TextValue::Block(self.parse_nodes(depth + 1)?)),
            Some(Token::Open('[')) => {
                let mut items = Vec::new();
                loop {
                    match self.next().map(|located| located.token.clone()) {
                        Some(Token::Word(word)) => items.push(word),
                        Some(Token::Close(']')) => return Ok(TextValue::List(items)),
                        _ => {
                            return Err(Error::InvalidResource(format!(
                                "malformed list for {} starting on line {}", name, line)));
                        }
                    }
                }
            }
            _ => Err(Error::InvalidResource(format!(
                "{} on line {} has no value", name, line))),
        }
    }
}

#[cfg(test)]
#[path = "text_parser_tests.rs"]
mod tests;
