//! Property-based tests for the ledger's invariants
//!
//! Each case opens a temporary sled database, so case counts are kept low.
//! The properties cover:
//!
//! 1. Id freshness and zeroed metrics for every valid submission
//! 2. Bound violations rejected with no state change
//! 3. Submission counts matching successful submits per principal
//! 4. The authorization predicate agreeing with owner/grant membership
//! 5. Counters that move by exactly one on success and not at all on failure

use proptest::prelude::*;
use report_ledger::limits::{
    MAX_CATEGORY_LEN, MAX_DESCRIPTION_LEN, MAX_TAG_LEN, MAX_TAGS, MAX_TITLE_LEN,
};
use report_ledger::metrics::Counter;
use report_ledger::{
    CallContext, Capability, ErrorKind, LedgerConfig, Metrics, Principal, ReportDraft,
    ReportLedger,
};

fn ledger() -> ReportLedger {
    ReportLedger::open(&LedgerConfig::new().temporary(true)).unwrap()
}

fn principals(n: usize) -> Vec<Principal> {
    (0..n).map(|_| Principal::generate("user_").unwrap()).collect()
}

// PROPERTY TEST STRATEGIES

/// Text of at most `max` characters drawn from `class`
fn bounded_text(class: &str, max: usize) -> impl Strategy<Value = String> {
    proptest::string::string_regex(&format!("{class}{{0,{max}}}")).unwrap()
}

/// Strategy to generate drafts inside every bound, including multi-byte text
fn valid_draft_strategy() -> impl Strategy<Value = ReportDraft> {
    (
        bounded_text("[a-zé ]", MAX_TITLE_LEN),
        bounded_text("[a-z ]", MAX_DESCRIPTION_LEN),
        bounded_text("[a-z-]", MAX_CATEGORY_LEN),
        prop::collection::vec(bounded_text("[a-z0-9]", MAX_TAG_LEN), 0..=MAX_TAGS),
        any::<u64>(),
        any::<bool>(),
    )
        .prop_map(|(title, description, category, tags, estimate, public)| {
            ReportDraft::new()
                .set_title(&title)
                .set_description(&description)
                .set_category(&category)
                .set_tags(tags)
                .set_eco_impact_estimate(estimate)
                .set_visibility(public)
        })
}

/// Strategy to generate drafts that break exactly one bound
fn invalid_draft_strategy() -> impl Strategy<Value = ReportDraft> {
    prop_oneof![
        "[a-z]{101,140}".prop_map(|t| ReportDraft::new().set_title(&t)),
        "[a-z]{1001,1040}".prop_map(|d| ReportDraft::new().set_description(&d)),
        "[a-z]{51,80}".prop_map(|c| ReportDraft::new().set_category(&c)),
        prop::collection::vec("[a-z]{1,5}", 11..20).prop_map(|t| ReportDraft::new().set_tags(t)),
        "[a-z]{21,40}".prop_map(|t| ReportDraft::new().add_tag("ok").add_tag(&t)),
    ]
}

fn capability_strategy() -> impl Strategy<Value = Capability> {
    prop::sample::select(Capability::ALL.to_vec())
}

#[derive(Debug, Clone)]
enum MetricOp {
    Upvote,
    Downvote,
    View(usize),
    Resolve(usize),
}

/// Callers are indexes into a fixed set of principals; 0 is the owner
fn metric_op_strategy() -> impl Strategy<Value = MetricOp> {
    prop_oneof![
        Just(MetricOp::Upvote),
        Just(MetricOp::Downvote),
        (0usize..3).prop_map(MetricOp::View),
        (0usize..3).prop_map(MetricOp::Resolve),
    ]
}

// PROPERTY TESTS
proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: every valid submission gets an unused id and all-zero metrics
    #[test]
    fn prop_valid_submit_is_fresh_and_zeroed(
        drafts in prop::collection::vec(valid_draft_strategy(), 1..6)
    ) {
        let ledger = ledger();
        let owner = principals(1).remove(0);
        let mut seen = std::collections::BTreeSet::new();

        for (clock, draft) in drafts.into_iter().enumerate() {
            let id = ledger.submit(&CallContext::new(owner.clone(), clock as u64), draft).unwrap();
            prop_assert!(seen.insert(id), "id {} was issued twice", id);
            prop_assert_eq!(ledger.get_metrics(id).unwrap(), Some(Metrics::default()));
            prop_assert_eq!(ledger.get_report(id).unwrap().unwrap().status, "open");
        }
    }

    /// Property: a draft over any bound is rejected and leaves nothing behind
    #[test]
    fn prop_bound_violation_creates_nothing(draft in invalid_draft_strategy()) {
        let ledger = ledger();
        let owner = principals(1).remove(0);

        let err = ledger.submit(&CallContext::new(owner.clone(), 1), draft).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        prop_assert_eq!(ledger.get_user_report_count(&owner).unwrap(), 0);
        prop_assert!(ledger.get_report(report_ledger::ReportId(1)).unwrap().is_none());
    }

    /// Property: the per-principal count equals that principal's successful submits
    #[test]
    fn prop_user_report_count_tracks_successes(
        attempts in prop::collection::vec((0usize..3, any::<bool>()), 0..12)
    ) {
        let ledger = ledger();
        let users = principals(3);
        let mut expected = [0u64; 3];

        for (clock, (who, valid)) in attempts.into_iter().enumerate() {
            let draft = if valid {
                ReportDraft::new().set_title("ok")
            } else {
                ReportDraft::new().set_title(&"x".repeat(MAX_TITLE_LEN + 1))
            };
            let outcome = ledger.submit(&CallContext::new(users[who].clone(), clock as u64), draft);
            prop_assert_eq!(outcome.is_ok(), valid);
            if valid {
                expected[who] += 1;
            }
        }

        for (user, count) in users.iter().zip(expected) {
            prop_assert_eq!(ledger.get_user_report_count(user).unwrap(), count);
        }
    }

    /// Property: is_authorized holds exactly for the owner or a grant carrying the capability,
    /// and update_status succeeds exactly when UpdateStatus is authorized
    #[test]
    fn prop_authorization_matches_grants(
        granted in prop::collection::vec(capability_strategy(), 0..=5),
        asked in capability_strategy(),
        has_grant in any::<bool>(),
    ) {
        let ledger = ledger();
        let people = principals(2);
        let (owner, collab) = (&people[0], &people[1]);
        let id = ledger.submit(&CallContext::new(owner.clone(), 1), ReportDraft::new()).unwrap();

        if has_grant {
            ledger
                .add_collaborator(&CallContext::new(owner.clone(), 2), id, collab, "member", &granted)
                .unwrap();
        }

        let expected = has_grant && granted.contains(&asked);
        prop_assert!(ledger.is_authorized(id, owner, asked).unwrap());
        prop_assert_eq!(ledger.is_authorized(id, collab, asked).unwrap(), expected);

        let may_update = has_grant && granted.contains(&Capability::UpdateStatus);
        let outcome = ledger.update_status(&CallContext::new(collab.clone(), 3), id, "moved");
        prop_assert_eq!(outcome.is_ok(), may_update);
        let status = ledger.get_report(id).unwrap().unwrap().status;
        prop_assert_eq!(status, if may_update { "moved" } else { "open" });
    }

    /// Property: counters never decrease; a success bumps one counter by one,
    /// a failure changes nothing
    #[test]
    fn prop_counters_are_monotonic(
        public in any::<bool>(),
        ops in prop::collection::vec(metric_op_strategy(), 1..20),
    ) {
        let ledger = ledger();
        // 0 owner, 1 collaborator with view + update-metrics, 2 stranger
        let people = principals(3);
        let draft = ReportDraft::new().set_visibility(public);
        let id = ledger.submit(&CallContext::new(people[0].clone(), 1), draft).unwrap();
        ledger
            .add_collaborator(
                &CallContext::new(people[0].clone(), 2),
                id,
                &people[1],
                "resolver",
                &[Capability::ViewReport, Capability::UpdateMetrics],
            )
            .unwrap();

        for (clock, op) in ops.into_iter().enumerate() {
            let before = ledger.get_metrics(id).unwrap().unwrap();
            let (outcome, counter, allowed) = match op {
                MetricOp::Upvote => (ledger.upvote(id), Counter::Upvotes, public),
                MetricOp::Downvote => (ledger.downvote(id), Counter::Downvotes, public),
                MetricOp::View(who) => (
                    ledger.increment_view(&CallContext::new(people[who].clone(), clock as u64), id),
                    Counter::Views,
                    public || who < 2,
                ),
                MetricOp::Resolve(who) => (
                    ledger.increment_resolution_attempt(
                        &CallContext::new(people[who].clone(), clock as u64),
                        id,
                    ),
                    Counter::ResolutionAttempts,
                    who < 2,
                ),
            };
            let after = ledger.get_metrics(id).unwrap().unwrap();

            prop_assert_eq!(outcome.is_ok(), allowed);
            if allowed {
                prop_assert_eq!(after, before.incremented(counter));
            } else {
                prop_assert_eq!(outcome.unwrap_err().kind(), ErrorKind::Unauthorized);
                prop_assert_eq!(after, before);
            }
        }
    }
}
