use perfmux_scheduler::{coalesce, emit, pass_count, InlineSource};
use perfmux_shared::types::arch::{ArchitectureProfile, Block};
use perfmux_shared::types::counter::Counter;
use perfmux_shared::utils::ceil_div;
use proptest::prelude::*;

fn ordinary_blocks() -> Vec<Block> {
    Block::ALL
        .iter()
        .copied()
        .filter(|b| !b.is_channel_addressable())
        .collect()
}

/// Spec with `counts[i]` counters for the i-th ordinary block, `aggregated`
/// aggregated TCC counters and `per_channel` channel counters on every
/// channel enabled in `mask`
fn spec_text(counts: &[usize], aggregated: usize, per_channel: usize, mask: &[bool]) -> String {
    let mut tokens = Vec::new();
    for (block, &n) in ordinary_blocks().iter().zip(counts) {
        tokens.extend((0..n).map(|i| format!("{}_C{:02}", block, i)));
    }
    tokens.extend((0..aggregated).map(|i| format!("TCC_AGG{:02}_sum", i)));
    for (ch, &enabled) in mask.iter().enumerate() {
        if enabled {
            // reverse order so the coalescer has to sort
            tokens.extend((0..per_channel).rev().map(|i| format!("TCC_M{:02}[{}]", i, ch)));
        }
    }

    let mut text = String::new();
    for chunk in tokens.chunks(7) {
        text.push_str("pmc: ");
        text.push_str(&chunk.join(" "));
        text.push('\n');
    }
    text
}

fn names(counters: &[Counter]) -> Vec<String> {
    counters.iter().map(|c| c.name.clone()).collect()
}

proptest! {
    #[test]
    fn schedule_respects_capacity_and_round_trips(
        counts in prop::collection::vec(0usize..20, 9),
        aggregated in 0usize..10,
        per_channel in 0usize..10,
        mask in prop::collection::vec(any::<bool>(), 16),
    ) {
        let profile = ArchitectureProfile::builtin("mi50").unwrap();
        let text = spec_text(&counts, aggregated, per_channel, &mask);
        let buckets = coalesce(&[InlineSource::new("prop", text)], &profile).unwrap().buckets;
        let passes = emit(&buckets, &profile).unwrap();

        // passes are numbered contiguously
        for (i, pass) in passes.iter().enumerate() {
            prop_assert_eq!(pass.index, i);
            prop_assert!(!pass.is_empty());
        }

        // pass count follows the per-block formula
        let tcc_cap = profile.capacity(Block::Tcc).unwrap();
        let mut expected = ceil_div(buckets.aggregated().len(), tcc_cap)
            + ceil_div(buckets.max_channel_len(), tcc_cap);
        for block in ordinary_blocks() {
            let cap = profile.capacity(block).unwrap();
            expected = expected.max(ceil_div(buckets.block(block).len(), cap));
        }
        prop_assert_eq!(passes.len(), expected);
        prop_assert_eq!(pass_count(&buckets, &profile).unwrap(), expected);

        // no slice exceeds its block's capacity; concatenation reproduces the bucket
        for block in Block::ALL {
            let cap = profile.capacity(block).unwrap();
            let mut joined = Vec::new();
            for pass in &passes {
                prop_assert!(pass.slice(block).len() <= cap);
                joined.extend(names(pass.slice(block)));
            }
            prop_assert_eq!(joined, names(buckets.block(block)));
        }

        for ch in 0..profile.channels as usize {
            let mut joined = Vec::new();
            for pass in &passes {
                prop_assert!(pass.channel_slice(ch).len() <= tcc_cap);
                joined.extend(names(pass.channel_slice(ch)));
            }
            prop_assert_eq!(joined, names(buckets.channel(ch)));
        }

        // every counter lands in exactly one pass
        let total: usize = passes.iter().map(|p| p.len()).sum();
        prop_assert_eq!(total, buckets.len());
    }

    #[test]
    fn channel_slices_stay_aligned(
        per_channel in 1usize..12,
        mask in prop::collection::vec(any::<bool>(), 16),
    ) {
        let profile = ArchitectureProfile::builtin("mi50").unwrap();
        let text = spec_text(&[0; 9], 0, per_channel, &mask);
        let buckets = coalesce(&[InlineSource::new("prop", text)], &profile).unwrap().buckets;
        let passes = emit(&buckets, &profile).unwrap();

        for pass in &passes {
            let populated: Vec<Vec<&str>> = pass
                .channels
                .iter()
                .filter(|slice| !slice.is_empty())
                .map(|slice| slice.iter().map(|c| c.base_name()).collect())
                .collect();
            for other in populated.iter().skip(1) {
                prop_assert_eq!(other, &populated[0]);
            }
        }
    }

    #[test]
    fn single_block_within_capacity_is_one_pass(n in 1usize..=8) {
        let profile = ArchitectureProfile::builtin("mi200").unwrap();
        let mut counts = [0usize; 9];
        counts[0] = n;
        let text = spec_text(&counts, 0, 0, &[]);
        let buckets = coalesce(&[InlineSource::new("prop", text)], &profile).unwrap().buckets;
        let passes = emit(&buckets, &profile).unwrap();

        prop_assert_eq!(passes.len(), 1);
        prop_assert_eq!(passes[0].len(), n);
    }
}
