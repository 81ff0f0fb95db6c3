// Draft composer: extract-then-submit state machine.
//
// Idle -> Extracting -> PointsReady -> Submitting -> Idle
//
// A failed extraction returns to the stable phase it started from (Idle, or
// PointsReady when re-extracting); a failed submission returns to
// PointsReady with the draft untouched.

use koe_core::comment::is_blank;
use koe_core::protocol::{ComposerPhase, ComposerSnapshot};

#[derive(Debug, Default)]
pub struct Composer {
    content: String,
    extracted_points: Vec<String>,
    phase: ComposerPhase,
    submit_offered: bool,
    /// Phase to fall back to if the in-flight extraction fails.
    resume_phase: ComposerPhase,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ComposerPhase {
        self.phase
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn extracted_points(&self) -> &[String] {
        &self.extracted_points
    }

    pub fn submit_offered(&self) -> bool {
        self.submit_offered
    }

    pub fn snapshot(&self) -> ComposerSnapshot {
        ComposerSnapshot {
            phase: self.phase,
            extracted_points: self.extracted_points.clone(),
            submit_offered: self.submit_offered,
        }
    }

    /// Enter `Extracting` for `content`.
    ///
    /// Returns the text to send to the extraction service, or `None` when the
    /// draft is blank or another request is outstanding.
    pub fn begin_extraction(&mut self, content: &str) -> Option<String> {
        if is_blank(content) {
            return None;
        }
        match self.phase {
            ComposerPhase::Idle | ComposerPhase::PointsReady => {}
            ComposerPhase::Extracting | ComposerPhase::Submitting => return None,
        }

        self.content = content.to_string();
        self.resume_phase = self.phase;
        self.phase = ComposerPhase::Extracting;
        Some(self.content.clone())
    }

    /// Store the extracted points. Submission is offered only when there is
    /// at least one point.
    pub fn extraction_succeeded(&mut self, points: Vec<String>) {
        if self.phase != ComposerPhase::Extracting {
            return;
        }
        self.extracted_points = points;
        self.submit_offered = !self.extracted_points.is_empty();
        self.phase = if self.submit_offered {
            ComposerPhase::PointsReady
        } else {
            ComposerPhase::Idle
        };
    }

    /// Leave the points and submit control as they were before the request.
    pub fn extraction_failed(&mut self) {
        if self.phase == ComposerPhase::Extracting {
            self.phase = self.resume_phase;
        }
    }

    /// Enter `Submitting` for `content`.
    ///
    /// Returns the text to publish, or `None` unless points are ready and the
    /// draft is non-blank.
    pub fn begin_submission(&mut self, content: &str) -> Option<String> {
        if self.phase != ComposerPhase::PointsReady
            || self.extracted_points.is_empty()
            || is_blank(content)
        {
            return None;
        }

        self.content = content.to_string();
        self.phase = ComposerPhase::Submitting;
        Some(self.content.clone())
    }

    /// Reset the draft after the store accepted it.
    pub fn submission_succeeded(&mut self) {
        if self.phase != ComposerPhase::Submitting {
            return;
        }
        self.content.clear();
        self.extracted_points.clear();
        self.submit_offered = false;
        self.phase = ComposerPhase::Idle;
        self.resume_phase = ComposerPhase::Idle;
    }

    /// Keep the draft so the user can retry.
    pub fn submission_failed(&mut self) {
        if self.phase == ComposerPhase::Submitting {
            self.phase = ComposerPhase::PointsReady;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn points(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// Composer with points ready for "road widening concerns".
    fn ready() -> Composer {
        let mut c = Composer::new();
        c.begin_extraction("road widening concerns").unwrap();
        c.extraction_succeeded(points(&["traffic safety", "budget impact"]));
        c
    }

    #[test]
    fn blank_content_never_starts_extraction() {
        let mut c = Composer::new();
        assert_eq!(c.begin_extraction(""), None);
        assert_eq!(c.begin_extraction("  \n\t"), None);
        assert_eq!(c.phase(), ComposerPhase::Idle);
    }

    #[test]
    fn successful_extraction_offers_submit() {
        let mut c = Composer::new();
        assert_eq!(
            c.begin_extraction("road widening concerns").as_deref(),
            Some("road widening concerns")
        );
        assert_eq!(c.phase(), ComposerPhase::Extracting);

        c.extraction_succeeded(points(&["traffic safety", "budget impact"]));
        assert_eq!(c.phase(), ComposerPhase::PointsReady);
        assert_eq!(c.extracted_points(), ["traffic safety", "budget impact"]);
        assert!(c.submit_offered());
    }

    #[test]
    fn empty_extraction_result_does_not_offer_submit() {
        let mut c = Composer::new();
        c.begin_extraction("hmm").unwrap();
        c.extraction_succeeded(vec![]);
        assert_eq!(c.phase(), ComposerPhase::Idle);
        assert!(!c.submit_offered());
        assert_eq!(c.begin_submission("hmm"), None);
    }

    #[test]
    fn failed_extraction_returns_to_idle() {
        let mut c = Composer::new();
        c.begin_extraction("road widening concerns").unwrap();
        c.extraction_failed();
        assert_eq!(c.phase(), ComposerPhase::Idle);
        assert!(c.extracted_points().is_empty());
        assert!(!c.submit_offered());
    }

    #[test]
    fn failed_re_extraction_keeps_previous_points() {
        let mut c = ready();
        c.begin_extraction("road widening concerns, revised").unwrap();
        assert!(!c.snapshot().is_submitting());
        c.extraction_failed();
        assert_eq!(c.phase(), ComposerPhase::PointsReady);
        assert_eq!(c.extracted_points(), ["traffic safety", "budget impact"]);
        assert!(c.submit_offered());
    }

    #[test]
    fn second_extraction_blocked_while_in_flight() {
        let mut c = Composer::new();
        c.begin_extraction("a").unwrap();
        assert_eq!(c.begin_extraction("a"), None);
    }

    #[test]
    fn submission_requires_points() {
        let mut c = Composer::new();
        assert_eq!(c.begin_submission("road widening concerns"), None);

        c.begin_extraction("road widening concerns").unwrap();
        assert_eq!(c.begin_submission("road widening concerns"), None);
    }

    #[test]
    fn submission_requires_non_blank_content() {
        let mut c = ready();
        assert_eq!(c.begin_submission("   "), None);
        assert_eq!(c.phase(), ComposerPhase::PointsReady);
    }

    #[test]
    fn successful_submission_resets_draft() {
        let mut c = ready();
        assert_eq!(
            c.begin_submission("road widening concerns").as_deref(),
            Some("road widening concerns")
        );
        assert_eq!(c.phase(), ComposerPhase::Submitting);
        assert_eq!(c.begin_extraction("more"), None);

        c.submission_succeeded();
        assert_eq!(c.phase(), ComposerPhase::Idle);
        assert!(c.content().is_empty());
        assert!(c.extracted_points().is_empty());
        assert!(!c.submit_offered());
    }

    #[test]
    fn failed_submission_keeps_draft_for_retry() {
        let mut c = ready();
        c.begin_submission("road widening concerns").unwrap();
        c.submission_failed();

        assert_eq!(c.phase(), ComposerPhase::PointsReady);
        assert_eq!(c.content(), "road widening concerns");
        assert_eq!(c.extracted_points().len(), 2);
        assert!(c.submit_offered());
        assert!(c.begin_submission("road widening concerns").is_some());
    }

    #[test]
    fn late_results_outside_their_phase_are_ignored() {
        let mut c = Composer::new();
        c.extraction_succeeded(points(&["x"]));
        c.submission_succeeded();
        assert_eq!(c.snapshot(), ComposerSnapshot::default());
    }
}
