//! Cross-chunk deduplication of validated claims

use linkedclaims_domain::similarity::near_identical;
use linkedclaims_domain::Claim;
use tracing::debug;

/// Whether two claims describe the same fact
///
/// Same claim type, same subject and aspect (ignoring case), and statements
/// that are near-identical at `threshold`.
pub fn is_duplicate(a: &Claim, b: &Claim, threshold: f64) -> bool {
    a.claim_type == b.claim_type
        && a.subject.trim().eq_ignore_ascii_case(b.subject.trim())
        && same_aspect(a.aspect.as_deref(), b.aspect.as_deref())
        && near_identical(&a.statement, &b.statement, threshold)
}

fn same_aspect(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        (None, None) => true,
        _ => false,
    }
}

/// Whether `challenger` should replace `incumbent` as the surviving variant
fn outranks(challenger: &Claim, incumbent: &Claim) -> bool {
    if challenger.confidence != incumbent.confidence {
        return challenger.confidence > incumbent.confidence;
    }
    challenger.source_chunk_index < incumbent.source_chunk_index
}

/// Merge duplicate claims
///
/// `claims` must be in extraction order (chunk index, then position within
/// the chunk). The survivor of each group absorbs the supporting chunks of
/// every claim it replaced. The output keeps extraction order of the
/// survivors. Returns the deduplicated claims and the number merged away.
pub fn dedup_claims(claims: Vec<Claim>, threshold: f64) -> (Vec<Claim>, usize) {
    let mut kept: Vec<(usize, Claim)> = Vec::with_capacity(claims.len());
    let mut merged = 0;

    for (sequence, claim) in claims.into_iter().enumerate() {
        let Some(slot) = kept
            .iter_mut()
            .find(|(_, existing)| is_duplicate(existing, &claim, threshold))
        else {
            kept.push((sequence, claim));
            continue;
        };

        merged += 1;
        let (kept_sequence, existing) = slot;
        debug!(
            subject = %claim.subject,
            kept_chunk = existing.source_chunk_index,
            dropped_chunk = claim.source_chunk_index,
            "Merging duplicate claim"
        );

        if outranks(&claim, existing) {
            let mut supporting = std::mem::take(&mut existing.supporting_chunks);
            supporting.extend(claim.supporting_chunks.iter().copied());
            *existing = claim;
            existing.supporting_chunks = supporting;
            *kept_sequence = sequence;
        } else {
            existing
                .supporting_chunks
                .extend(claim.supporting_chunks.iter().copied());
        }
    }

    kept.sort_by_key(|(sequence, claim)| (claim.source_chunk_index, *sequence));
    (kept.into_iter().map(|(_, claim)| claim).collect(), merged)
}
