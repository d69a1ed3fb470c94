use std::collections::BTreeSet;

use crate::data_handling::gene_size::GeneSizeIndex;

/// Pick one size-matched negative control per positive gene.
///
/// For each positive present in the size index, the candidate with the
/// smallest absolute size difference wins, ties broken by lexicographic gene
/// id. The positive gene itself is never a candidate; a candidate that is
/// itself in the positive set is rejected and removed from that search.
/// Positives absent from the index produce no negative. The returned list
/// may repeat a gene (one per positive it matched); callers dedupe when
/// assigning labels.
pub fn match_negatives(positives: &[String], sizes: &GeneSizeIndex) -> Vec<String> {
    let positive_set: BTreeSet<&str> = positives.iter().map(String::as_str).collect();
    let mut negatives = Vec::new();

    for gene in positives {
        let Some(&target) = sizes.get(gene) else {
            continue;
        };

        let mut rejected: BTreeSet<&str> = BTreeSet::new();
        loop {
            let candidate = sizes
                .iter()
                .filter(|(id, _)| id.as_str() != gene.as_str() && !rejected.contains(id.as_str()))
                .min_by(|a, b| {
                    let da = a.1.abs_diff(target);
                    let db = b.1.abs_diff(target);
                    da.cmp(&db).then_with(|| a.0.cmp(b.0))
                });

            let Some((id, _)) = candidate else {
                break; // pool exhausted
            };

            if positive_set.contains(id.as_str()) {
                rejected.insert(id.as_str());
                continue;
            }

            negatives.push(id.clone());
            break;
        }
    }

    negatives
}
