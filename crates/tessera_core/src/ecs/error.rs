use crate::ecs::Entity;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WorldError>;

/// Errors reported by world registration and expression resolution.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("entity is already named '{existing}', cannot rename it to '{name}'")]
    InconsistentName { name: String, existing: String },

    #[error("name '{name}' already identifies entity {existing}")]
    NameInUse { name: String, existing: Entity },

    #[error("component '{name}' was registered with size {existing}, not {requested}")]
    InvalidComponentSize {
        name: String,
        existing: usize,
        requested: usize,
    },

    #[error("component '{name}' was registered with alignment {existing}, not {requested}")]
    InvalidComponentAlignment {
        name: String,
        existing: usize,
        requested: usize,
    },

    #[error("type '{name}' is already defined with a different expression")]
    AlreadyDefined { name: String },

    #[error("registration is not allowed while {stage_count} stages are active")]
    InvalidWhileStaged { stage_count: usize },

    #[error("stages cannot be reconfigured while the world is readonly")]
    InvalidWhileReadonly,

    #[error("entity {entity} is referenced as a type but has no type record")]
    MissingTypeRecord { entity: Entity },

    #[error("invalid configuration: {0}")]
    Config(#[source] serde_json::Error),
}

/// Diagnostic for a rejected type expression, pointing at the offending column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    name: Option<String>,
    expr: String,
    column: usize,
    message: String,
}

impl ParseError {
    pub(crate) fn new(
        name: Option<&str>,
        expr: &str,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        let err = Self {
            name: name.map(str::to_string),
            expr: expr.to_string(),
            column,
            message: message.into(),
        };
        tracing::error!(
            name = name.unwrap_or("<anonymous>"),
            expr,
            column,
            "{}",
            err.message
        );
        err
    }

    /// Name of the entity the expression was resolved for, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn expr(&self) -> &str {
        &self.expr
    }

    /// Byte offset of the offending term in the expression.
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "{}: ", name)?;
        }
        writeln!(f, "{}: {}", self.column, self.message)?;
        writeln!(f, "    {}", self.expr)?;
        write!(f, "    {:>width$}", "^", width = self.column + 1)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caret_points_at_column() {
        let err = ParseError::new(Some("Movable"), "Position, col:Foo", 10, "bad term");
        let rendered = err.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Movable: 10: bad term");
        assert_eq!(lines[1], "    Position, col:Foo");
        assert_eq!(lines[2], "              ^");
    }
}
