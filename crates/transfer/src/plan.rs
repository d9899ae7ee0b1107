use crate::TransferError;

/// A contiguous, inclusive byte range `[from, to]` of the remote object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part {
    pub index: usize,
    pub from: u64,
    pub to: u64,
}

impl Part {
    /// Number of bytes covered by this part; never zero.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.to - self.from + 1
    }

    /// Value of the `Range` request header for this part.
    pub fn range_header(&self) -> String {
        format!("bytes={}-{}", self.from, self.to)
    }
}

/// An ordered partition of `[0, total_size)`.
///
/// A whole-file plan is fetched with a single unranged request and never
/// goes through the merger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    total_size: u64,
    parts: Vec<Part>,
    ranged: bool,
}

impl TransferPlan {
    fn whole(total_size: u64) -> Self {
        let parts = if total_size == 0 {
            Vec::new()
        } else {
            vec![Part {
                index: 0,
                from: 0,
                to: total_size - 1,
            }]
        };
        Self {
            total_size,
            parts,
            ranged: false,
        }
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Returns `true` if the object is fetched with one unranged request.
    pub fn is_whole_file(&self) -> bool {
        !self.ranged
    }
}

/// Partitions `[0, total_size)` into at most `max_parts` contiguous ranges.
///
/// Every part spans `target_part_size` bytes unless the resulting count
/// exceeds `max_parts`, in which case the count is clamped and each part
/// spans `total_size / max_parts` bytes. The last part always ends at
/// `total_size - 1` and absorbs any remainder.
pub fn plan_parts(
    total_size: u64,
    target_part_size: u64,
    max_parts: usize,
    supports_ranges: bool,
) -> Result<TransferPlan, TransferError> {
    if target_part_size == 0 {
        return Err(TransferError::InvalidPlan("part size must be positive".into()));
    }
    if max_parts == 0 {
        return Err(TransferError::InvalidPlan("part count must be positive".into()));
    }

    if !supports_ranges || total_size <= target_part_size || max_parts == 1 {
        return Ok(TransferPlan::whole(total_size));
    }

    let mut part_count = total_size.div_ceil(target_part_size);
    let mut each_size = target_part_size;
    if part_count > max_parts as u64 {
        part_count = max_parts as u64;
        each_size = total_size / part_count;
    }

    let part_count = part_count as usize;
    let mut parts = Vec::with_capacity(part_count);
    let mut from = 0u64;
    for index in 0..part_count {
        let to = if index + 1 == part_count {
            total_size - 1
        } else {
            from + each_size - 1
        };
        parts.push(Part { index, from, to });
        from = to + 1;
    }

    Ok(TransferPlan {
        total_size,
        parts,
        ranged: true,
    })
}
