//! Property-based tests using proptest
//!
//! Invariants of GPU identification and comparison building:
//! - Identification is pure and case-insensitive
//! - Unknown names fall through unchanged with the sentinel rank
//! - Intersection alignment keeps exactly the shared sequence lengths
//! - Percent of peak scales linearly with bandwidth

use std::collections::BTreeSet;

use attn_compare::compare::{percent_of_peak, Alignment, Comparison};
use attn_compare::gpu::GpuCatalog;
use attn_compare::results::{BenchmarkRow, ResultTable};
use proptest::prelude::*;

fn table(gpu: &str, lens: &BTreeSet<u64>) -> ResultTable {
    let rows = lens
        .iter()
        .map(|&s| BenchmarkRow {
            gpu: Some(gpu.to_string()),
            label: "MHA".to_string(),
            seq_len: s,
            ms_tok: 0.01,
            bw_gbs: 100.0,
            kv_mb: None,
            peak_mb: None,
        })
        .collect();
    ResultTable::from_rows(format!("{gpu}.csv"), rows).expect("non-empty rows")
}

// ============================================================================
// IDENTIFIER PROPERTY TESTS
// ============================================================================

proptest! {
    /// Identifying twice yields the same result
    #[test]
    fn prop_identify_idempotent(name in ".{0,64}") {
        let catalog = GpuCatalog::builtin();
        prop_assert_eq!(catalog.identify(&name), catalog.identify(&name));
    }

    /// Any name embedding a profile pattern resolves to that profile (or an earlier one)
    #[test]
    fn prop_embedded_pattern_matches(
        prefix in "[a-z0-9 ]{0,12}",
        suffix in "[a-z0-9 ]{0,12}",
        idx in 0usize..4,
        upper in any::<bool>(),
    ) {
        let catalog = GpuCatalog::builtin();
        let profile = &catalog.profiles()[idx];
        let mut name = format!("{prefix}{}{suffix}", profile.pattern);
        if upper {
            name = name.to_uppercase();
        }

        let id = catalog.identify(&name);
        prop_assert!(id.sort_rank <= idx);
        prop_assert!(id.peak_bw_gbs.is_some());
    }

    /// Names containing no pattern fall back to the raw name
    #[test]
    fn prop_unknown_names_fall_back(name in "[b-g]{0,24}") {
        let catalog = GpuCatalog::builtin();
        let id = catalog.identify(&name);
        prop_assert_eq!(&id.display_name, &name);
        prop_assert_eq!(id.peak_bw_gbs, None);
        prop_assert_eq!(id.sort_rank, catalog.len());
    }
}

// ============================================================================
// COMPARISON PROPERTY TESTS
// ============================================================================

proptest! {
    /// Intersection alignment leaves every GPU with exactly the shared lengths
    #[test]
    fn prop_intersection_is_shared_set(
        a in prop::collection::btree_set(1u64..64, 1..12),
        b in prop::collection::btree_set(1u64..64, 1..12),
    ) {
        let shared: BTreeSet<u64> = a.intersection(&b).copied().collect();
        let tables = vec![table("A", &a), table("B", &b)];
        let result = Comparison::build(&tables, &GpuCatalog::builtin(), "MHA", Alignment::Intersection);

        if shared.is_empty() {
            prop_assert!(result.is_err());
        } else {
            let cmp = result.unwrap();
            for s in &cmp.series {
                prop_assert_eq!(&s.seq_lens(), &shared);
            }
        }
    }

    /// Per-GPU alignment never drops a sequence length
    #[test]
    fn prop_per_gpu_keeps_all_lengths(
        a in prop::collection::btree_set(1u64..1_000_000, 1..16),
    ) {
        let tables = vec![table("A", &a)];
        let cmp = Comparison::build(&tables, &GpuCatalog::builtin(), "MHA", Alignment::PerGpu).unwrap();
        prop_assert_eq!(&cmp.series[0].seq_lens(), &a);
    }

    /// Percent of peak is linear in measured bandwidth
    #[test]
    fn prop_percent_of_peak_linear(bw in 0.0f64..5000.0, peak in 1.0f64..5000.0) {
        let pct = percent_of_peak(bw, peak);
        prop_assert!((pct - bw * 100.0 / peak).abs() < 1e-9 * (1.0 + pct.abs()));
        prop_assert!((percent_of_peak(peak, peak) - 100.0).abs() < 1e-9);
    }
}
