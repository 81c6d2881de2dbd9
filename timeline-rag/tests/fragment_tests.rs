//! Property tests for fragment building.

use proptest::prelude::*;
use timeline_rag::{
    Accomplishment, FragmentBuilder, FragmentContent, Section, WorkRecord, build_fragments,
};

fn arb_accomplishment() -> impl Strategy<Value = Accomplishment> {
    ("[A-Za-z ]{1,20}", "[A-Za-z ,.]{0,80}", proptest::collection::vec("[A-Za-z]{1,10}", 0..4))
        .prop_map(|(headline, context, skills)| Accomplishment { headline, context, skills })
}

fn rendered(accomplishment: &Accomplishment, with_headline: bool) -> String {
    if accomplishment.context.trim().is_empty() {
        accomplishment.headline.clone()
    } else if with_headline {
        format!("{}: {}", accomplishment.headline, accomplishment.context)
    } else {
        accomplishment.context.clone()
    }
}

fn arb_record() -> impl Strategy<Value = WorkRecord> {
    (
        "[A-Za-z]{1,12}",
        "[A-Za-z ]{1,20}",
        proptest::collection::vec("[A-Za-z ]{0,30}", 0..4),
        proptest::collection::vec(arb_accomplishment(), 0..6),
    )
        .prop_map(|(company, job_title, responsibilities, accomplishments)| WorkRecord {
            company,
            job_title,
            start_date: "2020".into(),
            end_date: String::new(),
            responsibilities,
            accomplishments,
        })
}

mod prop_fragment_building {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn building_is_deterministic(record in arb_record(), include in any::<bool>()) {
            let builder = FragmentBuilder::new().include_responsibilities(include);
            prop_assert_eq!(builder.build(&record), builder.build(&record.clone()));
        }

        #[test]
        fn one_fragment_per_accomplishment_in_record_order(record in arb_record()) {
            let fragments = build_fragments(&record);

            prop_assert_eq!(fragments.len(), record.accomplishments.len());
            for (fragment, accomplishment) in fragments.iter().zip(&record.accomplishments) {
                prop_assert_eq!(&fragment.metadata.headline, &accomplishment.headline);
                prop_assert_eq!(&fragment.metadata.skills, &accomplishment.skills);
                prop_assert_eq!(&fragment.metadata.company, &record.company);
                prop_assert_eq!(fragment.metadata.section, Section::Accomplishments);
                prop_assert_eq!(&fragment.content, &rendered(accomplishment, true));
            }
        }

        #[test]
        fn responsibilities_follow_accomplishments(record in arb_record()) {
            let fragments = FragmentBuilder::new()
                .content(FragmentContent::Context)
                .include_responsibilities(true)
                .build(&record);

            let lines: Vec<&String> =
                record.responsibilities.iter().filter(|line| !line.trim().is_empty()).collect();
            let accomplishment_count = record.accomplishments.len();
            prop_assert_eq!(fragments.len(), accomplishment_count + lines.len());

            for (fragment, accomplishment) in fragments.iter().zip(&record.accomplishments) {
                prop_assert_eq!(&fragment.content, &rendered(accomplishment, false));
            }
            for (fragment, line) in fragments[accomplishment_count..].iter().zip(lines) {
                prop_assert_eq!(&fragment.content, line);
                prop_assert_eq!(fragment.metadata.section, Section::Responsibilities);
                prop_assert!(fragment.metadata.headline.is_empty());
            }
        }
    }
}

#[test]
fn record_without_accomplishments_has_no_fragments() {
    let record = WorkRecord {
        company: "Acme".into(),
        responsibilities: vec!["On call".into()],
        ..WorkRecord::default()
    };
    assert!(build_fragments(&record).is_empty());
}

#[test]
fn blank_context_falls_back_to_the_headline() {
    let record = WorkRecord {
        company: "Acme".into(),
        accomplishments: vec![Accomplishment::new("Shipped v2", "  ", ["Rust"])],
        ..WorkRecord::default()
    };

    for content in [FragmentContent::Context, FragmentContent::HeadlineAndContext] {
        let fragments = FragmentBuilder::new().content(content).build(&record);
        assert_eq!(fragments[0].content, "Shipped v2");
    }
}
