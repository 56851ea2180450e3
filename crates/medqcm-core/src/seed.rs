//! Seed dataset
//!
//! The store is built once at startup from this fixed dataset; there is no
//! persistence between sessions. Content mirrors the medical curriculum
//! layout: four academic years, two semesters each.

use crate::models::{DataStore, Module, PdfResource, Question, Semester, Year};

/// Build the startup dataset
pub fn initial_store() -> DataStore {
    DataStore {
        years: vec![
            Year::new("annee-1", "1ère Année Médecine")
                .with_semester(
                    Semester::new("s1", "Semestre 1")
                        .with_module(
                            Module::new("mod-anat-1", "Anatomie I")
                                .with_description("Ostéologie du membre supérieur et inférieur")
                                .with_pdf(PdfResource::new("pdf1", "Cours Ostéologie.pdf", "#"))
                                .with_pdf(PdfResource::new("pdf2", "Cours Arthrologie.pdf", "#"))
                                .with_question(
                                    Question::single(
                                        "q1",
                                        "Quel est l'os le plus long du corps humain ?",
                                        vec![
                                            "Humérus".into(),
                                            "Fémur".into(),
                                            "Tibia".into(),
                                            "Fibula".into(),
                                        ],
                                        1,
                                    )
                                    .with_explanation(
                                        "Le fémur est l'os de la cuisse et c'est le plus long du corps.",
                                    ),
                                )
                                .with_question(
                                    Question::single(
                                        "q2",
                                        "Combien de vertèbres lombaires possède l'homme ?",
                                        vec!["7".into(), "12".into(), "5".into(), "3".into()],
                                        2,
                                    )
                                    .with_explanation("Il y a 5 vertèbres lombaires (L1 à L5)."),
                                ),
                        )
                        .with_module(
                            Module::new("mod-cyto-1", "Cytologie")
                                .with_description("Biologie cellulaire"),
                        ),
                )
                .with_semester(
                    Semester::new("s2", "Semestre 2")
                        .with_module(Module::new("mod-phy-1", "Physiologie")),
                ),
            Year::new("annee-2", "2ème Année Médecine")
                .with_semester(
                    Semester::new("s3", "Semestre 3").with_module(
                        Module::new("mod-s3-1", "Module S3 Exemple")
                            .with_description("Description..."),
                    ),
                )
                .with_semester(Semester::new("s4", "Semestre 4")),
            Year::new("annee-3", "3ème Année Médecine")
                .with_semester(Semester::new("s5", "Semestre 5"))
                .with_semester(Semester::new("s6", "Semestre 6")),
            Year::new("annee-4", "4ème Année Médecine")
                .with_semester(Semester::new("s7", "Semestre 7"))
                .with_semester(Semester::new("s8", "Semestre 8")),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_shape() {
        let store = initial_store();
        assert_eq!(store.years.len(), 4);
        assert!(store.years.iter().all(|y| y.semesters.len() == 2));
    }

    #[test]
    fn test_seed_anatomy_module() {
        let store = initial_store();
        let module = &store.year("annee-1").unwrap().semesters[0].modules[0];
        assert_eq!(module.id, "mod-anat-1");
        assert_eq!(module.questions.len(), 2);
        assert_eq!(module.pdfs.len(), 2);
        assert_eq!(module.questions[0].single_correct_index(), Some(1));
    }

    #[test]
    fn test_seed_ids_unique_within_parents() {
        let store = initial_store();
        let mut year_ids: Vec<_> = store.years.iter().map(|y| y.id.clone()).collect();
        year_ids.sort();
        year_ids.dedup();
        assert_eq!(year_ids.len(), store.years.len());

        for year in &store.years {
            let mut ids: Vec<_> = year.semesters.iter().map(|s| s.id.clone()).collect();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), year.semesters.len());
        }
    }
}
