use serde_json::Value;
use thiserror::Error;

use crate::parser::MAX_DOCUMENT_DEPTH;
use crate::schema::{FieldType, ObjectType};
use crate::unifier::{SampleTally, UnifiedSchema};

pub const DEFAULT_ROOT_TYPE_NAME: &str = "WebhookPayload";
pub const DEFAULT_HANDLER_NAME: &str = "handleWebhook";

/// Levels of array/object nesting the emitter renders before giving up.
/// Every document the parser accepts is shallower, so only hand-built schemas can hit it.
pub const MAX_NESTING_DEPTH: usize = MAX_DOCUMENT_DEPTH;

const INDENT: &str = "  ";

// Reserved and strict-mode reserved words, plus the primitive type keywords.
const TS_KEYWORDS: [&str; 55] = [
    "any", "as", "bigint", "boolean", "break", "case", "catch", "class", "const", "continue",
    "debugger", "declare", "default", "delete", "do", "else", "enum", "export", "extends",
    "false", "finally", "for", "function", "if", "implements", "import", "in", "instanceof",
    "interface", "let", "never", "new", "null", "number", "object", "package", "private",
    "protected", "public", "return", "static", "string", "super", "switch", "symbol", "this",
    "throw", "true", "try", "type", "typeof", "undefined", "unknown", "var", "void",
];

// Global types the generated code refers to or that would confuse readers if shadowed.
const TS_GLOBAL_TYPES: [&str; 22] = [
    "Array", "BigInt", "Boolean", "Date", "Error", "Function", "JSON", "Map", "Math", "Number",
    "Object", "Omit", "Partial", "Pick", "Promise", "Readonly", "Record", "RegExp", "Required",
    "Set", "String", "Symbol",
];

/// Names used in the emitted source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmitOptions {
    pub root_type_name: String,
    pub handler_name: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            root_type_name: DEFAULT_ROOT_TYPE_NAME.to_owned(),
            handler_name: DEFAULT_HANDLER_NAME.to_owned(),
        }
    }
}

impl EmitOptions {
    /// Both names must be usable identifiers, and the root type can't shadow a global.
    pub fn validate(&self) -> Result<(), EmitError> {
        validate_identifier(&self.root_type_name, "root type name")?;
        validate_identifier(&self.handler_name, "handler name")?;
        if TS_GLOBAL_TYPES.contains(&self.root_type_name.as_str()) {
            return Err(EmitError::InvalidIdentifier {
                name: self.root_type_name.clone(),
                role: "root type name",
                reason: "it shadows a built-in type",
            });
        }
        Ok(())
    }
}

/// Enumeration of reasons a schema can't be rendered.
/// We fail instead of returning source text that wouldn't compile.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EmitError {
    #[error("{name:?} cannot be used as the {role}: {reason}")]
    InvalidIdentifier {
        name: String,
        role: &'static str,
        reason: &'static str,
    },
    #[error("schema nests deeper than {limit} levels")]
    NestingTooDeep { limit: usize },
}

/// Render a TypeScript module declaring the schema and a handler typed against it.
/// The output only depends on the schema and the options.
pub fn emit(schema: &UnifiedSchema, options: &EmitOptions) -> Result<String, EmitError> {
    options.validate()?;

    let mut emitter = Emitter {
        options,
        declarations: Vec::new(),
    };

    let root_alias = match &schema.root {
        FieldType::Object(object) => {
            emitter.declare(object, &options.root_type_name, 0)?;
            None
        }
        FieldType::Unknown => {
            emitter.declare(&ObjectType::new(), &options.root_type_name, 0)?;
            None
        }
        other => {
            let expression = emitter.render_type(other, &options.root_type_name, 0)?;
            Some(format!(
                "export type {} = {};",
                options.root_type_name, expression
            ))
        }
    };

    let mut blocks: Vec<String> = Vec::with_capacity(emitter.declarations.len() + 2);
    blocks.extend(root_alias);
    blocks.extend(emitter.declarations.iter().map(Declaration::render));
    blocks.push(handler(options));

    let mut code = header(&schema.tally);
    code.push('\n');
    code.push_str(&blocks.join("\n\n"));
    code.push('\n');

    Ok(code)
}

fn handler(options: &EmitOptions) -> String {
    format!(
        "export async function {}(payload: {}): Promise<void> {{\n\
         {INDENT}// Handle the webhook payload here.\n\
         }}",
        options.handler_name, options.root_type_name
    )
}

struct Declaration {
    name: String,
    shape: ObjectType,
    fields: Vec<String>,
}

impl Declaration {
    fn render(&self) -> String {
        if self.fields.is_empty() {
            return format!("export interface {} {{}}", self.name);
        }

        let mut out = format!("export interface {} {{\n", self.name);
        for field in &self.fields {
            out.push_str(INDENT);
            out.push_str(field);
            out.push('\n');
        }
        out.push('}');
        out
    }
}

struct Emitter<'a> {
    options: &'a EmitOptions,
    declarations: Vec<Declaration>,
}

impl Emitter<'_> {
    fn render_type(
        &mut self,
        field_type: &FieldType,
        hint: &str,
        depth: usize,
    ) -> Result<String, EmitError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(EmitError::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
            });
        }

        let rendered = match field_type {
            FieldType::Unknown => "unknown".to_owned(),
            FieldType::Null => "null".to_owned(),
            FieldType::Boolean => "boolean".to_owned(),
            FieldType::Number => "number".to_owned(),
            FieldType::String => "string".to_owned(),
            FieldType::Array(element) => {
                let element_hint = singular(hint);
                let inner = self.render_type(element, &element_hint, depth + 1)?;
                match **element {
                    FieldType::Union(_) => format!("({inner})[]"),
                    _ => format!("{inner}[]"),
                }
            }
            FieldType::Object(object) => {
                let name = self.fresh_name(object, hint);
                self.declare(object, &name, depth)?
            }
            FieldType::Union(members) => {
                let mut rendered = Vec::with_capacity(members.len());
                for member in members {
                    rendered.push(self.render_type(member, hint, depth)?);
                }
                rendered.join(" | ")
            }
        };

        Ok(rendered)
    }

    /// Declare `object` under `name` unless a structurally identical object was already
    /// declared, in which case that declaration's name is returned.
    fn declare(
        &mut self,
        object: &ObjectType,
        name: &str,
        depth: usize,
    ) -> Result<String, EmitError> {
        if let Some(existing) = self.declarations.iter().find(|d| d.shape == *object) {
            return Ok(existing.name.clone());
        }

        // Register before rendering the fields so nested declarations follow their parent.
        let index = self.declarations.len();
        self.declarations.push(Declaration {
            name: name.to_owned(),
            shape: object.clone(),
            fields: Vec::with_capacity(object.len()),
        });

        let mut fields = Vec::with_capacity(object.len());
        for (field_name, slot) in object.fields() {
            let rendered = self.render_type(&slot.field_type, field_name, depth + 1)?;
            let marker = if slot.optional { "?" } else { "" };
            fields.push(format!("{}{marker}: {rendered};", property_key(field_name)));
        }
        self.declarations[index].fields = fields;

        Ok(name.to_owned())
    }

    /// Pick an unused interface name for `object` based on the field it was found under.
    fn fresh_name(&self, object: &ObjectType, hint: &str) -> String {
        if let Some(existing) = self.declarations.iter().find(|d| d.shape == *object) {
            return existing.name.clone();
        }

        let base = pascal_case(hint);
        let mut candidate = base.clone();
        let mut suffix = 2;
        while self.is_taken(&candidate) {
            candidate = format!("{base}{suffix}");
            suffix += 1;
        }
        candidate
    }

    fn is_taken(&self, name: &str) -> bool {
        name == self.options.root_type_name
            || TS_GLOBAL_TYPES.contains(&name)
            || self.declarations.iter().any(|d| d.name == name)
    }
}

fn header(tally: &SampleTally) -> String {
    if tally.total == 0 {
        return "// No captured samples matched the requested ids.\n".to_owned();
    }

    let plural = if tally.total == 1 { "" } else { "s" };
    let mut header = format!(
        "// Generated from {} captured webhook sample{plural}.\n",
        tally.total
    );

    let excluded = tally.excluded();
    if excluded > 0 {
        let (noun, verb) = if excluded == 1 {
            ("sample", "was")
        } else {
            ("samples", "were")
        };
        header.push_str(&format!(
            "// {excluded} {noun} {verb} excluded from inference ({} empty, {} not valid JSON).\n",
            tally.empty, tally.opaque
        ));
    }

    header
}

fn validate_identifier(name: &str, role: &'static str) -> Result<(), EmitError> {
    if !is_identifier(name) {
        return Err(EmitError::InvalidIdentifier {
            name: name.to_owned(),
            role,
            reason: "it is not a valid identifier",
        });
    }
    if TS_KEYWORDS.contains(&name) {
        return Err(EmitError::InvalidIdentifier {
            name: name.to_owned(),
            role,
            reason: "it is a reserved word",
        });
    }
    Ok(())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

/// Property names that aren't identifiers are written as string literals.
fn property_key(name: &str) -> String {
    if is_identifier(name) {
        name.to_owned()
    } else {
        Value::String(name.to_owned()).to_string()
    }
}

fn pascal_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for part in raw
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
    {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
        }
    }

    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert_str(0, "Field");
    }
    out
}

/// Name hint for the elements of an array found under `hint`.
fn singular(hint: &str) -> String {
    if let Some(stem) = hint.strip_suffix("ies").filter(|stem| !stem.is_empty()) {
        format!("{stem}y")
    } else if let Some(stem) = hint.strip_suffix("sses") {
        format!("{stem}ss")
    } else if let Some(stem) = hint
        .strip_suffix('s')
        .filter(|stem| !stem.is_empty() && !stem.ends_with('s'))
    {
        stem.to_owned()
    } else {
        format!("{hint}Item")
    }
}
