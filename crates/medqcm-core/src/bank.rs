//! Question bank mutator
//!
//! Pure functions over the content tree. Every mutation returns a new
//! `DataStore` root; the input is never modified in place, so views always
//! compare a complete old root against a complete new one.

use tracing::debug;

use crate::models::{DataStore, Module, Question};

/// Replace one module inside the tree.
///
/// The year and semester are located by id, then the module is matched by
/// the replacement's own id (not its position). Any lookup miss returns a
/// store deep-equal to the input. Callers are expected to pass valid ids;
/// the miss case is not surfaced as an error.
pub fn update_module(
    store: &DataStore,
    year_id: &str,
    semester_id: &str,
    module: &Module,
) -> DataStore {
    let mut next = store.clone();

    let Some(year) = next.years.iter_mut().find(|y| y.id == year_id) else {
        debug!(year_id, "update_module: year not found, no-op");
        return next;
    };
    let Some(semester) = year.semesters.iter_mut().find(|s| s.id == semester_id) else {
        debug!(semester_id, "update_module: semester not found, no-op");
        return next;
    };
    let Some(slot) = semester.modules.iter_mut().find(|m| m.id == module.id) else {
        debug!(module_id = %module.id, "update_module: module not found, no-op");
        return next;
    };

    *slot = module.clone();
    next
}

/// Find a module anywhere in the tree by its id.
pub fn find_module<'a>(store: &'a DataStore, module_id: &str) -> Option<&'a Module> {
    store
        .years
        .iter()
        .flat_map(|y| &y.semesters)
        .flat_map(|s| &s.modules)
        .find(|m| m.id == module_id)
}

/// Find the (year id, semester id) path of a module.
pub fn find_module_path<'a>(
    store: &'a DataStore,
    module_id: &str,
) -> Option<(&'a str, &'a str)> {
    for year in &store.years {
        for semester in &year.semesters {
            if semester.modules.iter().any(|m| m.id == module_id) {
                return Some((year.id.as_str(), semester.id.as_str()));
            }
        }
    }
    None
}

/// Append questions to a module located tree-wide by its stable id.
///
/// Used for commits whose origin may be stale (an async generation that
/// finished after the user navigated away): the target is resolved by id
/// at commit time, never through a held view reference. Returns the new
/// store and whether the module was found; on `false` the store is
/// deep-equal to the input and the caller should drop the questions.
pub fn append_questions(
    store: &DataStore,
    module_id: &str,
    questions: Vec<Question>,
) -> (DataStore, bool) {
    let mut next = store.clone();
    for year in &mut next.years {
        for semester in &mut year.semesters {
            if let Some(module) = semester.modules.iter_mut().find(|m| m.id == module_id) {
                module.questions.extend(questions);
                return (next, true);
            }
        }
    }
    debug!(module_id, "append_questions: module not found, dropping batch");
    (next, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PdfResource;
    use crate::seed::initial_store;

    fn updated_anatomy(store: &DataStore) -> Module {
        let module = find_module(store, "mod-anat-1").unwrap().clone();
        module.with_pdf(PdfResource::new("pdf3", "Cours Myologie.pdf", "#"))
    }

    #[test]
    fn test_update_module_replaces_only_target() {
        let store = initial_store();
        let module = updated_anatomy(&store);

        let next = update_module(&store, "annee-1", "s1", &module);

        // Target changed
        assert_eq!(find_module(&next, "mod-anat-1").unwrap().pdfs.len(), 3);

        // Every other branch is deep-equal to before
        assert_eq!(next.years[1], store.years[1]);
        assert_eq!(next.years[2], store.years[2]);
        assert_eq!(next.years[3], store.years[3]);
        assert_eq!(next.years[0].semesters[1], store.years[0].semesters[1]);
        assert_eq!(
            next.years[0].semesters[0].modules[1],
            store.years[0].semesters[0].modules[1]
        );
        assert_ne!(next, store);
    }

    #[test]
    fn test_update_module_miss_is_noop() {
        let store = initial_store();
        let module = updated_anatomy(&store);

        assert_eq!(update_module(&store, "annee-9", "s1", &module), store);
        assert_eq!(update_module(&store, "annee-1", "s9", &module), store);

        let foreign = Module::new("mod-unknown", "Inconnu");
        assert_eq!(update_module(&store, "annee-1", "s1", &foreign), store);
    }

    #[test]
    fn test_update_module_matches_by_id_not_position() {
        let store = initial_store();
        // Cytologie is the second module of s1; its id alone drives the match
        let module = find_module(&store, "mod-cyto-1")
            .unwrap()
            .clone()
            .with_question(Question::manual("t", vec!["a".into(), "b".into()], [0]));

        let next = update_module(&store, "annee-1", "s1", &module);
        assert_eq!(find_module(&next, "mod-cyto-1").unwrap().questions.len(), 1);
        // Anatomie untouched
        assert_eq!(
            next.years[0].semesters[0].modules[0],
            store.years[0].semesters[0].modules[0]
        );
    }

    #[test]
    fn test_find_module_path() {
        let store = initial_store();
        assert_eq!(find_module_path(&store, "mod-phy-1"), Some(("annee-1", "s2")));
        assert_eq!(find_module_path(&store, "mod-missing"), None);
    }

    #[test]
    fn test_append_questions_by_id() {
        let store = initial_store();
        let batch = vec![
            Question::single("ai-1-0", "t", vec!["a".into(), "b".into()], 0),
            Question::single("ai-1-1", "t", vec!["a".into(), "b".into()], 1),
        ];

        let (next, found) = append_questions(&store, "mod-cyto-1", batch);
        assert!(found);
        assert_eq!(find_module(&next, "mod-cyto-1").unwrap().questions.len(), 2);
    }

    #[test]
    fn test_append_questions_vanished_module() {
        let store = initial_store();
        let batch = vec![Question::single("ai-1-0", "t", vec!["a".into(), "b".into()], 0)];

        let (next, found) = append_questions(&store, "mod-gone", batch);
        assert!(!found);
        assert_eq!(next, store);
    }
}
