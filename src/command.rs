use std::collections::BTreeMap;

/// Parsed value of one `-key=value` flag.
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    /// Bare `-key` with no `=`.
    Flag,
    Text(String),
    /// `[a,b,c]`
    List(Vec<String>),
    /// `{k1:v1,k2:v2}`
    Map(Vec<(String, String)>),
}

/// A command line reduced to its operation name and named arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommand {
    pub operation: String,
    pub flags: BTreeMap<String, FlagValue>,
}

impl ParsedCommand {
    pub fn has(&self, key: &str) -> bool {
        self.flags.contains_key(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.flags.get(key) {
            Some(FlagValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn list(&self, key: &str) -> Option<&[String]> {
        match self.flags.get(key) {
            Some(FlagValue::List(items)) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn map(&self, key: &str) -> Option<&[(String, String)]> {
        match self.flags.get(key) {
            Some(FlagValue::Map(pairs)) => Some(pairs.as_slice()),
            _ => None,
        }
    }
}

/// Parse one command line into (operation, named arguments). Blank input
/// parses to `None`. Tokens after the operation that do not start with `-`
/// are ignored.
pub fn parse_command(line: &str) -> Option<ParsedCommand> {
    let mut tokens = tokenize(line).into_iter();
    let operation = tokens.next()?;
    let mut flags = BTreeMap::new();
    for token in tokens {
        if let Some(stripped) = token.strip_prefix('-') {
            match stripped.split_once('=') {
                Some((key, value)) => {
                    flags.insert(key.to_string(), parse_value(value));
                }
                None => {
                    flags.insert(stripped.to_string(), FlagValue::Flag);
                }
            }
        }
    }
    Some(ParsedCommand { operation, flags })
}

/// Shell-like splitting: whitespace separates tokens, single and double
/// quotes group characters and are stripped. An unterminated quote runs to
/// the end of the line.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    for ch in line.chars() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                } else {
                    current.push(ch);
                }
            }
            None => {
                if ch == '\'' || ch == '"' {
                    quote = Some(ch);
                    in_token = true;
                } else if ch.is_whitespace() {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                } else {
                    current.push(ch);
                    in_token = true;
                }
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    tokens
}

/// `[a,b,c]` and `{k:v,...}` literals; anything else is bare text.
fn parse_value(value: &str) -> FlagValue {
    if value.len() >= 2 && value.starts_with('[') && value.ends_with(']') {
        let inner = &value[1..value.len() - 1];
        if inner.is_empty() {
            return FlagValue::List(Vec::new());
        }
        return FlagValue::List(inner.split(',').map(str::to_string).collect());
    }
    if value.len() >= 2 && value.starts_with('{') && value.ends_with('}') {
        let inner = &value[1..value.len() - 1];
        let mut pairs = Vec::new();
        for item in inner.split(',') {
            if item.is_empty() {
                continue;
            }
            match item.split_once(':') {
                Some((k, v)) => pairs.push((k.to_string(), v.to_string())),
                None => pairs.push((item.to_string(), String::new())),
            }
        }
        return FlagValue::Map(pairs);
    }
    FlagValue::Text(value.to_string())
}
