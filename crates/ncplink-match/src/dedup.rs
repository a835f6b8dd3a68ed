use crate::matcher::CommandMatcher;

/// Collapse a matcher sequence to its maximal elements under the
/// [`CommandMatcher::matches`] partial order.
///
/// Every input matcher is covered by at least one output matcher, and no
/// output matcher covers another. Ordering is stable: the slot of the first
/// appearance (or of the entry a more general matcher replaced) is kept.
///
/// O(n·m) with m the running output size; matcher sets per listener are
/// single-digit in practice.
///
/// An empty input yields an empty output; rejecting emptiness is the
/// listener constructor's job.
pub fn dedup_matchers(input: impl IntoIterator<Item = CommandMatcher>) -> Vec<CommandMatcher> {
    let mut maximal: Vec<CommandMatcher> = Vec::new();

    'next_candidate: for candidate in input {
        let mut slot = None;
        for (index, existing) in maximal.iter().enumerate() {
            if existing.matches(&candidate) {
                // Already covered; drop the candidate.
                continue 'next_candidate;
            }
            if candidate.matches(existing) {
                // Candidate is more general; take over this slot.
                slot = Some(index);
                break;
            }
        }
        match slot {
            Some(index) => {
                maximal[index] = candidate;
                // The new entry may also cover entries after the slot; drop
                // them so no output element matches another. Earlier entries
                // cannot be covered, or they would have taken the slot.
                let mut rest = index + 1;
                while rest < maximal.len() {
                    if maximal[index].matches(&maximal[rest]) {
                        maximal.remove(rest);
                    } else {
                        rest += 1;
                    }
                }
            }
            None => maximal.push(candidate),
        }
    }

    maximal
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn identical_matchers_collapse_to_one() {
        let out = dedup_matchers([
            CommandMatcher::for_command(1),
            CommandMatcher::for_command(1),
        ]);
        assert_eq!(out, vec![CommandMatcher::for_command(1)]);
    }

    #[test]
    fn catch_all_subsumes_specific() {
        let out = dedup_matchers([
            CommandMatcher::for_command(5),
            CommandMatcher::catch_all(),
        ]);
        assert_eq!(out, vec![CommandMatcher::catch_all()]);
    }

    #[test]
    fn specific_after_catch_all_is_dropped() {
        let out = dedup_matchers([
            CommandMatcher::catch_all(),
            CommandMatcher::for_command(5),
        ]);
        assert_eq!(out, vec![CommandMatcher::catch_all()]);
    }

    #[test]
    fn broader_matcher_replaces_narrower_in_place() {
        let narrow = CommandMatcher::for_command(1).with_field("status", json!(0));
        let unrelated = CommandMatcher::for_command(2);
        let broad = CommandMatcher::for_command(1);

        let out = dedup_matchers([narrow, unrelated.clone(), broad.clone()]);
        // The broad matcher takes the narrow one's slot, keeping order.
        assert_eq!(out, vec![broad, unrelated]);
    }

    #[test]
    fn unrelated_matchers_are_all_kept_in_order() {
        let a = CommandMatcher::for_command(1);
        let b = CommandMatcher::for_command(2);
        let c = CommandMatcher::for_command(3);

        let out = dedup_matchers([a.clone(), b.clone(), c.clone()]);
        assert_eq!(out, vec![a, b, c]);
    }

    #[test]
    fn sibling_constraints_on_same_header_are_incomparable() {
        let ok = CommandMatcher::for_command(1).with_field("status", json!(0));
        let err = CommandMatcher::for_command(1).with_field("status", json!(1));

        let out = dedup_matchers([ok.clone(), err.clone()]);
        assert_eq!(out, vec![ok, err]);
    }

    #[test]
    fn every_input_is_covered_by_some_output() {
        let inputs = vec![
            CommandMatcher::for_command(1).with_field("seq", json!(1)),
            CommandMatcher::for_command(1),
            CommandMatcher::for_command(2).with_field("seq", json!(2)),
            CommandMatcher::for_command(1).with_field("seq", json!(9)),
            CommandMatcher::catch_all(),
        ];

        let out = dedup_matchers(inputs.clone());
        assert!(!out.is_empty());
        for input in &inputs {
            assert!(
                out.iter().any(|kept| kept.matches(input)),
                "input {input:?} not covered by {out:?}"
            );
        }
    }

    #[test]
    fn replacement_also_drops_later_entries_the_general_matcher_covers() {
        let inputs = vec![
            CommandMatcher::for_command(1).with_field("status", json!(0)),
            CommandMatcher::for_command(2),
            CommandMatcher::for_command(1).with_field("status", json!(1)),
            CommandMatcher::for_command(1),
        ];

        // The bare cmd-1 matcher takes the first slot and sweeps out the
        // other cmd-1 entry; no output element may match another.
        let out = dedup_matchers(inputs);
        assert_eq!(
            out,
            vec![CommandMatcher::for_command(1), CommandMatcher::for_command(2)]
        );
        for (i, a) in out.iter().enumerate() {
            for (j, b) in out.iter().enumerate() {
                if i != j {
                    assert!(!a.matches(b), "{a:?} covers {b:?} in the output");
                }
            }
        }
        assert_eq!(out.clone(), dedup_matchers(out));
    }

    #[test]
    fn dedup_is_idempotent() {
        let inputs = vec![
            CommandMatcher::for_command(1).with_field("seq", json!(1)),
            CommandMatcher::for_command(1),
            CommandMatcher::for_command(2),
            CommandMatcher::for_command(2),
        ];

        let once = dedup_matchers(inputs);
        let twice = dedup_matchers(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(dedup_matchers(Vec::<CommandMatcher>::new()).is_empty());
    }
}
