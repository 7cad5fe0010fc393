use sea_orm::sea_query::SimpleExpr;
use sea_orm::{ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Value};

/// Ordered identifier lookup chain. Each step is tried in turn and the first
/// row found wins; a chain with no steps resolves to nothing without touching
/// the database.
///
/// Sources push their own identifier first, then whatever global identifiers
/// the record carries — either as one OR step (priority tie) or as further
/// sequential steps.
#[derive(Default)]
pub struct IdCandidates {
    steps: Vec<Condition>,
}

impl IdCandidates {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one single-column step, skipped entirely when the value is absent.
    #[must_use]
    pub fn then<C, V>(mut self, column: C, value: Option<V>) -> Self
    where
        C: ColumnTrait,
        V: Into<Value>,
    {
        if let Some(value) = value {
            self.steps.push(Condition::all().add(column.eq(value)));
        }
        self
    }

    /// Push one OR step across whichever of the given expressions are present.
    #[must_use]
    pub fn any_of<I>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = Option<SimpleExpr>>,
    {
        let mut condition = Condition::any();
        let mut present = false;
        for expr in exprs.into_iter().flatten() {
            condition = condition.add(expr);
            present = true;
        }
        if present {
            self.steps.push(condition);
        }
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub async fn resolve<E, C>(&self, conn: &C) -> Result<Option<E::Model>, DbErr>
    where
        E: EntityTrait,
        C: ConnectionTrait,
    {
        for condition in &self.steps {
            if let Some(found) = E::find().filter(condition.clone()).one(conn).await? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::movies;

    #[test]
    fn absent_values_produce_no_steps() {
        let candidates = IdCandidates::new()
            .then(movies::Column::RadarrId, None::<i32>)
            .any_of([None, None]);
        assert!(candidates.is_empty());
    }

    #[test]
    fn native_id_comes_before_global_or_step() {
        let candidates = IdCandidates::new()
            .then(movies::Column::RadarrId, Some(7))
            .any_of([
                Some(movies::Column::TmdbId.eq("603")),
                None,
                Some(movies::Column::ImdbId.eq("tt0133093")),
            ]);
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn sequential_steps_keep_their_order() {
        let candidates = IdCandidates::new()
            .then(movies::Column::JellyfinId, Some("jf-1"))
            .then(movies::Column::TmdbId, Some("603"))
            .then(movies::Column::ImdbId, None::<String>);
        assert_eq!(candidates.len(), 2);
    }
}
