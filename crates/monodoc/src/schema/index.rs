//! Index declaration grammar.
//!
//! A declaration is a brace-enclosed list of storage paths followed by
//! option flags:
//!
//! ```text
//! {name},unique,sparse
//! {name,surname},unique
//! {created},desc {owner,kind}
//! ```
//!
//! Several declarations may follow each other on one field; every `{`
//! starts a new one.

use std::fmt;

use thiserror::Error;

/// Option flags accepted after a field list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexOption {
    Unique,
    Sparse,
    Background,
    DropDups,
}

impl IndexOption {
    fn parse(word: &str) -> Option<Self> {
        match word {
            "unique" => Some(IndexOption::Unique),
            "sparse" => Some(IndexOption::Sparse),
            "background" => Some(IndexOption::Background),
            "dropdups" => Some(IndexOption::DropDups),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexOption::Unique => "unique",
            IndexOption::Sparse => "sparse",
            IndexOption::Background => "background",
            IndexOption::DropDups => "dropdups",
        }
    }
}

impl fmt::Display for IndexOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One index declaration as written on a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedIndex {
    /// Storage paths covered, in key order.
    pub fields: Vec<String>,
    /// Flags in declaration order.
    pub options: Vec<IndexOption>,
    /// Slot of the declaring field within `fields`. Sites that are not
    /// themselves part of the key (the base document) take the last slot.
    pub position: usize,
    pub descending: bool,
}

impl ParsedIndex {
    pub fn has_option(&self, option: IndexOption) -> bool {
        self.options.contains(&option)
    }

    pub fn is_compound(&self) -> bool {
        self.fields.len() > 1
    }

    /// Lower into the store's native index format.
    pub fn to_spec(&self) -> IndexSpec {
        let key = self
            .fields
            .iter()
            .map(|f| {
                if self.descending {
                    format!("-{f}")
                } else {
                    f.clone()
                }
            })
            .collect();

        IndexSpec {
            key,
            unique: self.has_option(IndexOption::Unique),
            sparse: self.has_option(IndexOption::Sparse),
            background: self.has_option(IndexOption::Background),
            drop_dups: self.has_option(IndexOption::DropDups),
        }
    }
}

/// Index definition in the form the store creates it.
///
/// Descending keys carry a `-` prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct IndexSpec {
    pub key: Vec<String>,
    pub unique: bool,
    pub sparse: bool,
    pub background: bool,
    pub drop_dups: bool,
}

impl IndexSpec {
    /// Conventional index name, `field_1_other_-1`.
    pub fn name(&self) -> String {
        self.key
            .iter()
            .map(|k| match k.strip_prefix('-') {
                Some(field) => format!("{field}_-1"),
                None => format!("{k}_1"),
            })
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// Collapse specs that lower to the same native index. Order of first
/// occurrence is kept.
pub fn dedup_specs(specs: impl IntoIterator<Item = IndexSpec>) -> Vec<IndexSpec> {
    let mut out: Vec<IndexSpec> = Vec::new();
    for spec in specs {
        if !out.contains(&spec) {
            out.push(spec);
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} in {input:?}")]
pub struct GrammarError {
    pub input: String,
    pub reason: String,
}

/// Parse every declaration in `source`.
///
/// `declaring_path` is the storage path of the field carrying the
/// annotation and only affects [`ParsedIndex::position`]. An empty source
/// yields no indexes.
pub fn parse_index(declaring_path: &str, source: &str) -> Result<Vec<ParsedIndex>, GrammarError> {
    let fail = |reason: &str| GrammarError {
        input: source.to_string(),
        reason: reason.to_string(),
    };

    let mut rest = source.trim();
    let mut parsed = Vec::new();

    while !rest.is_empty() {
        let Some(body) = rest.strip_prefix('{') else {
            return Err(fail("expected '{'"));
        };
        let close = body.find('}').ok_or_else(|| fail("unclosed '{'"))?;
        let list = &body[..close];
        if list.contains('{') {
            return Err(fail("nested '{'"));
        }

        let fields = list
            .split(',')
            .map(str::trim)
            .map(|name| {
                if name.is_empty() {
                    Err(fail("empty field name"))
                } else if !name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '$')
                {
                    Err(fail(&format!("invalid field name {name:?}")))
                } else {
                    Ok(name.to_string())
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let after = &body[close + 1..];
        let next_decl = after.find('{').unwrap_or(after.len());
        let (tail, remaining) = after.split_at(next_decl);
        let mut tail = tail.trim();
        if tail.contains('}') {
            return Err(fail("unexpected '}'"));
        }
        if !remaining.is_empty() {
            // the separator before the next declaration is optional
            tail = tail.strip_suffix(',').unwrap_or(tail).trim_end();
        }

        let mut options = Vec::new();
        let mut descending = false;
        if !tail.is_empty() {
            let Some(flags) = tail.strip_prefix(',') else {
                return Err(fail("expected ',' after '}'"));
            };
            for word in flags.split(',').map(str::trim) {
                if word.is_empty() {
                    return Err(fail("empty option"));
                }
                let lowered = word.to_ascii_lowercase();
                if lowered == "desc" {
                    descending = true;
                    continue;
                }
                let option = IndexOption::parse(&lowered)
                    .ok_or_else(|| fail(&format!("unknown option {word:?}")))?;
                if !options.contains(&option) {
                    options.push(option);
                }
            }
        }

        let position = fields
            .iter()
            .position(|f| f == declaring_path)
            .unwrap_or(fields.len() - 1);

        parsed.push(ParsedIndex {
            fields,
            options,
            position,
            descending,
        });
        rest = remaining.trim_start();
    }

    Ok(parsed)
}
