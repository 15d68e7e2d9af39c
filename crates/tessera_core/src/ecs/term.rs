// term.rs - Validation of parsed terms for type expressions
//
// A type expression may only list ids the implicit subject owns. Anything
// else (column names, operators, source modifiers, explicit subjects) is
// rejected with a diagnostic pointing at the term.

use crate::ecs::builtin::{THIS, WILDCARD};
use crate::ecs::parser::{parse_expr, FromKind, Oper, Subject, Term};
use crate::ecs::{Entity, Id, ParseError, Result, Role, World, WorldError};

/// A term with its identifiers resolved against the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ResolvedTerm {
    pub id: Id,
    /// `None` when the term was written with an empty subject.
    pub subject: Option<Entity>,
}

impl World {
    /// Resolve the ids of an expression without creating any tables.
    ///
    /// The returned list is only produced when every term is accepted; a
    /// rejected term discards everything collected before it.
    pub(crate) fn ids_from_expr(&self, name: Option<&str>, expr: &str) -> Result<Vec<Id>> {
        let mut ids = Vec::new();
        parse_expr(name, expr, |term| collect_term(self, name, expr, term, &mut ids))?;
        Ok(ids)
    }

    fn resolve_identifier(&self, ident: &str) -> Option<Entity> {
        if ident == "*" {
            return Some(WILDCARD);
        }
        self.lookup(ident).or_else(|| {
            ident
                .parse::<u64>()
                .ok()
                .map(Entity::from_raw)
                .filter(|entity| self.exists(*entity))
        })
    }

    pub(crate) fn resolve_term(
        &self,
        name: Option<&str>,
        expr: &str,
        term: &Term,
    ) -> Result<ResolvedTerm> {
        let error = |message: String| -> WorldError {
            ParseError::new(name, expr, term.column, message).into()
        };
        let resolve = |ident: &str| {
            self.resolve_identifier(ident)
                .ok_or_else(|| error(format!("unresolved identifier '{}'", ident)))
        };

        let pred = resolve(term.pred.as_str())?;
        let subject = match &term.subject {
            Subject::This => Some(THIS),
            Subject::Empty => None,
            Subject::Named(subject) => Some(resolve(subject.as_str())?),
        };
        let object = term.object.as_deref().map(resolve).transpose()?;

        let id = match (term.role, object) {
            (None | Some(Role::Pair), Some(object)) => Id::pair(pred, object),
            (Some(Role::Pair), None) => {
                return Err(error(format!("pair '{}' requires an object", term.pred)))
            }
            (Some(role), None) => Id::with_role(role, pred),
            (None, None) => pred.to_id(),
            (Some(role), Some(_)) => {
                return Err(error(format!(
                    "role '{}' cannot be combined with an object",
                    role.keyword()
                )))
            }
        };

        Ok(ResolvedTerm { id, subject })
    }
}

/// Validate one term and append its id to `ids`.
///
/// Terms with an empty subject are accepted without appending anything.
pub(crate) fn collect_term(
    world: &World,
    name: Option<&str>,
    expr: &str,
    term: Term,
    ids: &mut Vec<Id>,
) -> Result<()> {
    let reject = |message: &str| -> Result<()> {
        Err(ParseError::new(name, expr, term.column, message).into())
    };

    if term.name.is_some() {
        return reject("column names not supported in type expression");
    }

    if term.oper != Oper::And {
        return reject("operator other than AND not supported in type expression");
    }

    let resolved = world.resolve_term(name, expr, &term)?;

    let Some(subject) = resolved.subject else {
        tracing::trace!(pred = %term.pred, "skipping term with empty subject");
        return Ok(());
    };

    if term.from_kind != FromKind::Owned {
        return reject("source modifiers not supported for type expressions");
    }

    if subject != THIS {
        return reject("subject other than this not supported in type expression");
    }

    tracing::trace!(id = %resolved.id, column = term.column, "accepted term");
    ids.push(resolved.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{ComponentDesc, EntityDesc};

    fn world_with(names: &[&str]) -> World {
        let mut world = World::new();
        for name in names {
            world.new_entity(&EntityDesc::named(*name)).unwrap();
        }
        world
    }

    fn rejection(world: &World, expr: &str) -> ParseError {
        match world.ids_from_expr(Some("T"), expr) {
            Err(WorldError::Parse(err)) => err,
            other => panic!("expected rejection of {:?}, got {:?}", expr, other),
        }
    }

    #[test]
    fn test_collects_ids_in_term_order() {
        let mut world = World::new();
        let pos = world
            .new_component(&ComponentDesc::new("Position", 8, 4))
            .unwrap();
        let vel = world
            .new_component(&ComponentDesc::new("Velocity", 8, 4))
            .unwrap();

        let ids = world.ids_from_expr(None, "Velocity, Position").unwrap();
        assert_eq!(ids, vec![vel.to_id(), pos.to_id()]);
    }

    #[test]
    fn test_roles_and_pairs_are_encoded() {
        let world = world_with(&["Base", "Likes", "Bob"]);
        let base = world.lookup("Base").unwrap();
        let likes = world.lookup("Likes").unwrap();
        let bob = world.lookup("Bob").unwrap();

        let ids = world.ids_from_expr(None, "AND | Base, (Likes, Bob)").unwrap();
        assert_eq!(ids, vec![Id::with_role(Role::And, base), Id::pair(likes, bob)]);
    }

    #[test]
    fn test_empty_subject_is_a_no_op() {
        let world = world_with(&["Foo", "Bar"]);
        let bar = world.lookup("Bar").unwrap();
        let ids = world.ids_from_expr(None, "Foo(), Bar").unwrap();
        assert_eq!(ids, vec![bar.to_id()]);
    }

    #[test]
    fn test_unsupported_shapes_are_rejected() {
        let world = world_with(&["Foo", "Bar", "e1"]);

        let err = rejection(&world, "col:Foo");
        assert_eq!(err.column(), 0);
        assert!(err.message().contains("column names"));

        let err = rejection(&world, "Bar, !Foo");
        assert_eq!(err.column(), 5);
        assert!(err.message().contains("operator"));

        let err = rejection(&world, "PARENT:Foo");
        assert!(err.message().contains("source modifiers"));

        let err = rejection(&world, "Foo(e1)");
        assert!(err.message().contains("subject other than this"));

        let err = rejection(&world, "Foo, Missing");
        assert_eq!(err.column(), 5);
        assert!(err.message().contains("unresolved identifier 'Missing'"));
    }

    #[test]
    fn test_numeric_and_wildcard_identifiers() {
        let world = world_with(&["Foo"]);
        let foo = world.lookup("Foo").unwrap();
        let expr = format!("{}, *", foo.id());
        let ids = world.ids_from_expr(None, &expr).unwrap();
        assert_eq!(ids, vec![foo.to_id(), WILDCARD.to_id()]);
    }
}
