use sea_orm::entity::prelude::DateTimeUtc;
use sea_orm::{ActiveValue, Value};

/// Per-field merge policy applied to an `ActiveModel` built from the stored
/// row. Tracks whether any column was actually set, so unchanged records cost
/// no UPDATE.
///
/// Policies:
/// - `fill_once`: identifiers and stable facts — written only while the
///   stored value is null, never regressed or replaced.
/// - `overwrite`: volatile facts — the latest non-null source value wins; an
///   absent input leaves the stored value alone.
/// - `overwrite_required`: required columns that track the source verbatim.
/// - `overwrite_watched`: the watched pair moves as one unit, including back
///   to unwatched.
#[derive(Default)]
pub struct FieldMerge {
    changed: bool,
}

impl FieldMerge {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn changed(&self) -> bool {
        self.changed
    }

    pub fn fill_once<T>(&mut self, slot: &mut ActiveValue<Option<T>>, incoming: Option<T>)
    where
        T: PartialEq,
        Option<T>: Into<Value>,
    {
        let Some(incoming) = incoming else { return };

        let absent = match &*slot {
            ActiveValue::Unchanged(stored) | ActiveValue::Set(stored) => stored.is_none(),
            ActiveValue::NotSet => true,
        };
        if absent {
            *slot = ActiveValue::Set(Some(incoming));
            self.changed = true;
        }
    }

    pub fn overwrite<T>(&mut self, slot: &mut ActiveValue<Option<T>>, incoming: Option<T>)
    where
        T: PartialEq,
        Option<T>: Into<Value>,
    {
        let Some(incoming) = incoming else { return };

        let same = matches!(
            &*slot,
            ActiveValue::Unchanged(Some(stored)) | ActiveValue::Set(Some(stored))
                if *stored == incoming
        );
        if !same {
            *slot = ActiveValue::Set(Some(incoming));
            self.changed = true;
        }
    }

    pub fn overwrite_required<T>(&mut self, slot: &mut ActiveValue<T>, incoming: T)
    where
        T: PartialEq + Into<Value>,
    {
        let same = matches!(
            &*slot,
            ActiveValue::Unchanged(stored) | ActiveValue::Set(stored) if *stored == incoming
        );
        if !same {
            *slot = ActiveValue::Set(incoming);
            self.changed = true;
        }
    }

    pub fn overwrite_watched(
        &mut self,
        watched_slot: &mut ActiveValue<bool>,
        watched_at_slot: &mut ActiveValue<Option<DateTimeUtc>>,
        watched: bool,
        watched_at: Option<DateTimeUtc>,
    ) {
        self.overwrite_required(watched_slot, watched);

        let same = matches!(
            &*watched_at_slot,
            ActiveValue::Unchanged(stored) | ActiveValue::Set(stored) if *stored == watched_at
        );
        if !same {
            *watched_at_slot = ActiveValue::Set(watched_at);
            self.changed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sea_orm::ActiveValue;

    #[test]
    fn fill_once_writes_only_into_nulls() {
        let mut merge = FieldMerge::new();

        let mut empty: ActiveValue<Option<String>> = ActiveValue::Unchanged(None);
        merge.fill_once(&mut empty, Some("tt0133093".to_string()));
        assert_eq!(empty, ActiveValue::Set(Some("tt0133093".to_string())));
        assert!(merge.changed());

        let mut taken: ActiveValue<Option<String>> =
            ActiveValue::Unchanged(Some("tt0133093".to_string()));
        let mut merge = FieldMerge::new();
        merge.fill_once(&mut taken, Some("tt9999999".to_string()));
        assert_eq!(
            taken,
            ActiveValue::Unchanged(Some("tt0133093".to_string()))
        );
        assert!(!merge.changed());
    }

    #[test]
    fn fill_once_ignores_absent_input() {
        let mut merge = FieldMerge::new();
        let mut slot: ActiveValue<Option<i32>> = ActiveValue::Unchanged(None);
        merge.fill_once(&mut slot, None);
        assert_eq!(slot, ActiveValue::Unchanged(None));
        assert!(!merge.changed());
    }

    #[test]
    fn overwrite_skips_equal_values() {
        let mut merge = FieldMerge::new();
        let mut slot: ActiveValue<Option<String>> =
            ActiveValue::Unchanged(Some("continuing".to_string()));

        merge.overwrite(&mut slot, Some("continuing".to_string()));
        assert!(!merge.changed());

        merge.overwrite(&mut slot, Some("ended".to_string()));
        assert_eq!(slot, ActiveValue::Set(Some("ended".to_string())));
        assert!(merge.changed());
    }

    #[test]
    fn required_overwrite_tracks_the_source() {
        let mut merge = FieldMerge::new();
        let mut slot: ActiveValue<String> = ActiveValue::Unchanged("Old Title".to_string());
        merge.overwrite_required(&mut slot, "New Title".to_string());
        assert_eq!(slot, ActiveValue::Set("New Title".to_string()));
        assert!(merge.changed());
    }

    #[test]
    fn watched_pair_moves_together_including_unwatch() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap();
        let mut watched: ActiveValue<bool> = ActiveValue::Unchanged(true);
        let mut watched_at = ActiveValue::Unchanged(Some(at));

        let mut merge = FieldMerge::new();
        merge.overwrite_watched(&mut watched, &mut watched_at, false, None);
        assert_eq!(watched, ActiveValue::Set(false));
        assert_eq!(watched_at, ActiveValue::Set(None));
        assert!(merge.changed());
    }
}
