use crate::error::OptimizeError;
use log::trace;

/// Translates a solver's raw candidate vector into the pixel layout the cost
/// function should evaluate.
///
/// An optional binary mask freezes part of the grid: mask-enabled (`1`)
/// positions are overwritten from the candidate vector in mask order, while
/// disabled positions keep the value stored in the mask itself. Without a
/// mask the candidate is the layout.
///
/// The first call returns the resolved layout directly. Later calls diff the
/// new layout against the previously resolved one so that a downstream
/// exporter could apply incremental geometry edits instead of regenerating
/// the whole pattern.
pub struct PixelUpdatePolicy {
    /// Physical cell pitch, carried for callers that need spatial context.
    /// Not used by the resolution logic itself.
    pixel_size: f64,
    mask: Option<Vec<u8>>,
    previous: Option<Vec<u8>>,
}

impl PixelUpdatePolicy {
    pub fn new(pixel_size: f64) -> Self {
        Self {
            pixel_size,
            mask: None,
            previous: None,
        }
    }

    /// Install a frozen-pixel mask. Enabled (`1`) positions become
    /// candidate-controlled; everything else stays at the mask's stored value.
    pub fn with_mask(mut self, mask: Vec<u8>) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn pixel_size(&self) -> f64 {
        self.pixel_size
    }

    /// Number of candidate entries expected per update: the count of enabled
    /// mask positions, or the full mask/layout length without one.
    pub fn enabled_positions(&self) -> Option<usize> {
        self.mask
            .as_ref()
            .map(|m| m.iter().filter(|&&bit| bit == 1).count())
    }

    /// Layout resolved by the most recent `update` call. Callers hand this to
    /// their exporter/simulator; the solver only ever sees the candidate side.
    pub fn layout(&self) -> Option<&[u8]> {
        self.previous.as_deref()
    }

    /// Resolve `candidate` into a full layout and record it.
    ///
    /// Returns the layout itself on the first call. On later calls the
    /// element-wise difference against the previous layout is computed, but
    /// the reconfigured-positions buffer handed back is never populated from
    /// it and stays all-zero. Incremental exporters therefore currently see
    /// no deltas; see DESIGN.md before changing this.
    pub fn update(&mut self, candidate: &[u8]) -> Result<Vec<u8>, OptimizeError> {
        let layout = self.resolve(candidate)?;

        let out = match self.previous.take() {
            None => layout.clone(),
            Some(prev) => {
                let reconfigured = vec![0u8; layout.len()];
                let changed: usize = layout
                    .iter()
                    .zip(prev.iter())
                    .map(|(now, before)| usize::from(now != before))
                    .sum();
                trace!("layout update: {changed} of {} pixels changed", layout.len());
                // TODO: copy the per-position change flags into `reconfigured`
                // so incremental exporters stop seeing an empty delta.
                reconfigured
            }
        };

        self.previous = Some(layout);
        Ok(out)
    }

    fn resolve(&self, candidate: &[u8]) -> Result<Vec<u8>, OptimizeError> {
        match &self.mask {
            None => Ok(candidate.to_vec()),
            Some(mask) => {
                let expected = mask.iter().filter(|&&bit| bit == 1).count();
                if candidate.len() != expected {
                    return Err(OptimizeError::MaskMismatch {
                        expected,
                        got: candidate.len(),
                    });
                }

                let mut layout = mask.clone();
                let mut next = candidate.iter();
                for slot in layout.iter_mut() {
                    if *slot == 1 {
                        // `next` cannot run dry: one candidate entry per enabled slot.
                        *slot = *next.next().unwrap();
                    }
                }
                Ok(layout)
            }
        }
    }
}
