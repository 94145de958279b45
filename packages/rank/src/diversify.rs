//! Round-robin selection across neighborhood buckets.
//!
//! Parcels are grouped by [`ParcelRecord::area`] (neighborhood, else
//! supervisor district, else `"Unknown"`). Each pass over the buckets takes
//! the best remaining parcel from every non-empty bucket, so a single busy
//! neighborhood cannot fill the whole top-N on volume alone.
//!
//! [`ParcelRecord::area`]: parcel_distress_parcel_models::ParcelRecord::area

use std::collections::{BTreeMap, VecDeque};

use parcel_distress_parcel_models::ScoredParcel;

use crate::score::rank_order;

/// Options for [`diversify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiversifyOptions {
    /// Maximum number of parcels returned.
    pub total: usize,
    /// Requested parcels per bucket per pass. Only reported; every pass
    /// takes exactly one parcel from each non-empty bucket.
    pub per_round: usize,
}

impl Default for DiversifyOptions {
    fn default() -> Self {
        Self {
            total: 100,
            per_round: 8,
        }
    }
}

/// Selects up to `options.total` parcels spread across areas.
///
/// Buckets are visited in order of first appearance in `scored`. The
/// selection is returned in rank order (descending score, then ascending
/// parcel id).
#[must_use]
pub fn diversify(scored: Vec<ScoredParcel>, options: &DiversifyOptions) -> Vec<ScoredParcel> {
    let total = options.total;

    let mut order: Vec<String> = Vec::new();
    let mut buckets: BTreeMap<String, Vec<ScoredParcel>> = BTreeMap::new();
    for parcel in scored {
        let area = parcel.parcel.area().to_string();
        if !buckets.contains_key(&area) {
            order.push(area.clone());
        }
        buckets.entry(area).or_default().push(parcel);
    }

    let mut queues: Vec<VecDeque<ScoredParcel>> = order
        .iter()
        .filter_map(|area| buckets.remove(area))
        .map(|mut bucket| {
            bucket.sort_by(rank_order);
            VecDeque::from(bucket)
        })
        .collect();

    log::debug!(
        "Diversifying across {} areas (total={total}, per_round={})",
        queues.len(),
        options.per_round
    );

    let mut out = Vec::with_capacity(total);
    let mut passes = 0_usize;
    while out.len() < total && !queues.is_empty() {
        passes += 1;
        for queue in &mut queues {
            if out.len() >= total {
                break;
            }
            if let Some(parcel) = queue.pop_front() {
                out.push(parcel);
            }
        }
        queues.retain(|q| !q.is_empty());
    }

    out.sort_by(rank_order);
    out.truncate(total);

    log::debug!("Selected {} parcels in {passes} passes", out.len());

    out
}
