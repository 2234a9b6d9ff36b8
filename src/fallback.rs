//! Fallback tracking for `object`, `audio` and `video` contexts.
//!
//! Only the outermost closing boundary runs a check. Evidence found anywhere
//! inside (text, an `img`, a nested core media resource) satisfies the
//! enclosing context, and the flag is re-armed as soon as a check consumes
//! it so it never leaks into a sibling context.

use core::fmt;

/// Kind of context whose fallback is checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FallbackContext {
    /// `object` element.
    Object,
    /// `video` element.
    Video,
    /// `audio` element.
    Audio,
}

impl FallbackContext {
    /// Capitalized label used in diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            Self::Object => "Object",
            Self::Video => "Video",
            Self::Audio => "Audio",
        }
    }
}

impl fmt::Display for FallbackContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of one finalize check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FallbackCheck {
    /// Context that completed.
    pub context: FallbackContext,
    /// Whether valid fallback was observed.
    pub satisfied: bool,
}

/// Nested fallback state for one document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FallbackTracker {
    in_audio: bool,
    in_video: bool,
    object_depth: usize,
    has_valid_fallback: bool,
    checks: usize,
}

impl FallbackTracker {
    /// Create a tracker outside any context.
    pub fn new() -> Self {
        Self::default()
    }

    /// True while inside an unclosed `audio`, `video` or `object`.
    pub fn in_context(&self) -> bool {
        self.in_audio || self.in_video || self.object_depth > 0
    }

    /// True while inside an unclosed `audio`.
    pub fn in_audio(&self) -> bool {
        self.in_audio
    }

    /// True while inside an unclosed `video`.
    pub fn in_video(&self) -> bool {
        self.in_video
    }

    /// Number of currently open `object` elements.
    pub fn object_depth(&self) -> usize {
        self.object_depth
    }

    /// True once fallback evidence was seen for the pending check.
    pub fn has_valid_fallback(&self) -> bool {
        self.has_valid_fallback
    }

    /// Number of finalize checks run so far.
    pub fn checks_performed(&self) -> usize {
        self.checks
    }

    /// Innermost context that decides the pending check, if any is open.
    pub fn open_context(&self) -> Option<FallbackContext> {
        if self.object_depth > 0 {
            Some(FallbackContext::Object)
        } else if self.in_video {
            Some(FallbackContext::Video)
        } else if self.in_audio {
            Some(FallbackContext::Audio)
        } else {
            None
        }
    }

    /// True when no context is open.
    pub fn is_settled(&self) -> bool {
        !self.in_context()
    }

    /// `audio` start.
    pub fn enter_audio(&mut self) {
        self.in_audio = true;
    }

    /// `video` start.
    pub fn enter_video(&mut self) {
        self.in_video = true;
    }

    /// `object` start.
    pub fn enter_object(&mut self) {
        self.object_depth += 1;
    }

    /// Record fallback evidence that counts regardless of nesting, such as a
    /// video poster or an object with a core media `type`.
    pub fn satisfy(&mut self) {
        self.has_valid_fallback = true;
    }

    /// Record evidence found in element content. Ignored outside a context.
    pub fn satisfy_nested(&mut self) -> bool {
        if self.in_context() {
            self.has_valid_fallback = true;
        }
        self.in_context()
    }

    /// `object` end. Returns a check when the outermost object closes.
    pub fn exit_object(&mut self) -> Option<FallbackCheck> {
        let Some(depth) = self.object_depth.checked_sub(1) else {
            log::warn!("object end without matching start; ignoring");
            return None;
        };
        self.object_depth = depth;
        (depth == 0).then(|| self.finalize(FallbackContext::Object))
    }

    /// `video` end. Returns a check unless nested inside an object.
    pub fn exit_video(&mut self) -> Option<FallbackCheck> {
        let check = (self.object_depth == 0).then(|| self.finalize(FallbackContext::Video));
        self.in_video = false;
        check
    }

    /// `audio` end. Returns a check unless nested inside an object.
    pub fn exit_audio(&mut self) -> Option<FallbackCheck> {
        let check = (self.object_depth == 0).then(|| self.finalize(FallbackContext::Audio));
        self.in_audio = false;
        check
    }

    fn finalize(&mut self, context: FallbackContext) -> FallbackCheck {
        let satisfied = core::mem::take(&mut self.has_valid_fallback);
        self.checks += 1;
        log::debug!("{} fallback check: satisfied={}", context, satisfied);
        FallbackCheck { context, satisfied }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_object_fails_check() {
        let mut tracker = FallbackTracker::new();
        tracker.enter_object();
        let check = tracker.exit_object().expect("outer object finalizes");
        assert_eq!(check.context, FallbackContext::Object);
        assert!(!check.satisfied);
        assert!(tracker.is_settled());
    }

    #[test]
    fn open_context_prefers_object() {
        let mut tracker = FallbackTracker::new();
        assert_eq!(tracker.open_context(), None);
        tracker.enter_audio();
        assert_eq!(tracker.open_context(), Some(FallbackContext::Audio));
        tracker.enter_object();
        assert_eq!(tracker.open_context(), Some(FallbackContext::Object));
        let _ = tracker.exit_object();
        let _ = tracker.exit_audio();
        assert_eq!(tracker.open_context(), None);
    }

    #[test]
    fn nested_objects_check_once_at_outer_close() {
        let mut tracker = FallbackTracker::new();
        tracker.enter_object();
        tracker.enter_object();
        assert!(tracker.satisfy_nested());
        assert_eq!(tracker.exit_object(), None);
        let check = tracker.exit_object().expect("outer object finalizes");
        assert!(check.satisfied);
        assert_eq!(tracker.checks_performed(), 1);
        assert!(!tracker.has_valid_fallback());
    }

    #[test]
    fn flag_does_not_leak_into_sibling() {
        let mut tracker = FallbackTracker::new();
        tracker.enter_video();
        tracker.satisfy();
        assert!(tracker.exit_video().expect("video check").satisfied);
        tracker.enter_audio();
        assert!(!tracker.exit_audio().expect("audio check").satisfied);
    }

    #[test]
    fn video_inside_object_defers_to_object() {
        let mut tracker = FallbackTracker::new();
        tracker.enter_object();
        tracker.enter_video();
        assert_eq!(tracker.exit_video(), None);
        assert!(!tracker.in_video());
        assert!(tracker.exit_object().is_some());
    }

    #[test]
    fn evidence_outside_context_is_ignored() {
        let mut tracker = FallbackTracker::new();
        assert!(!tracker.satisfy_nested());
        assert!(!tracker.has_valid_fallback());
    }

    #[test]
    fn unmatched_object_end_is_ignored() {
        let mut tracker = FallbackTracker::new();
        assert_eq!(tracker.exit_object(), None);
        assert_eq!(tracker.object_depth(), 0);
        assert_eq!(tracker.checks_performed(), 0);
    }

    #[derive(Clone, Copy, Debug)]
    enum Step {
        Object,
        Audio,
        Video,
        Evidence,
    }

    fn step_strategy() -> impl Strategy<Value = Step> {
        prop_oneof![
            Just(Step::Object),
            Just(Step::Audio),
            Just(Step::Video),
            Just(Step::Evidence),
        ]
    }

    fn drive(tracker: &mut FallbackTracker, steps: &[Step]) {
        for step in steps {
            match step {
                Step::Object => {
                    tracker.enter_object();
                    tracker.exit_object();
                }
                Step::Audio => {
                    tracker.enter_audio();
                    tracker.exit_audio();
                }
                Step::Video => {
                    tracker.enter_video();
                    tracker.exit_video();
                }
                Step::Evidence => {
                    tracker.satisfy_nested();
                }
            }
        }
    }

    proptest! {
        // Well-nested objects always return to depth 0, whatever is inside.
        #[test]
        fn prop_object_depth_returns_to_zero(
            depth in 1usize..8,
            inner in prop::collection::vec(step_strategy(), 0..12)
        ) {
            let mut tracker = FallbackTracker::new();
            for _ in 0..depth {
                tracker.enter_object();
            }
            drive(&mut tracker, &inner);
            for _ in 0..depth {
                tracker.exit_object();
            }
            prop_assert_eq!(tracker.object_depth(), 0);
            prop_assert!(tracker.is_settled());
            prop_assert!(!tracker.has_valid_fallback());
        }

        // Extra end events never drive the depth below zero.
        #[test]
        fn prop_extra_object_ends_saturate(opens in 0usize..5, closes in 0usize..10) {
            let mut tracker = FallbackTracker::new();
            for _ in 0..opens {
                tracker.enter_object();
            }
            for _ in 0..closes {
                tracker.exit_object();
            }
            prop_assert_eq!(tracker.object_depth(), opens.saturating_sub(closes));
        }
    }
}
