use crate::sandbox::CapturedOutput;

/// Classified outcome of one build or test invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The toolchain reported no failure; carries what it printed
    Success(String),
    /// The toolchain rejected the submission; carries the full diagnostics
    CompileError(String),
    /// The build went through but the test target failed; carries the report
    TestFailure(String),
    /// The output could not be collected from the instance
    TransportError,
}

/// Substring-based classification of `make` output
///
/// The marker sets differ between endpoints on purpose. Changing either one
/// changes the grade of submissions that have already been handed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classifier {
    markers: &'static [&'static str],
    /// A non-zero exit without any marker counts as a failed test run
    nonzero_is_test_failure: bool,
}

impl Classifier {
    /// Plain builds of test submissions
    pub const BUILD: Self = Self {
        markers: &["Error"],
        nonzero_is_test_failure: false,
    };

    /// Exam compilation, where make's `Stop.` also marks a failed build
    pub const EXAM: Self = Self {
        markers: &["Error", "Stop"],
        nonzero_is_test_failure: false,
    };

    /// Test runs whose output is relayed to the caller
    pub const TEST_RUN: Self = Self {
        markers: &["Error"],
        nonzero_is_test_failure: true,
    };

    pub fn classify(&self, text: String) -> Verdict {
        if self.markers.iter().any(|m| text.contains(m)) {
            Verdict::CompileError(text)
        } else {
            Verdict::Success(text)
        }
    }

    pub fn classify_output(&self, output: CapturedOutput) -> Verdict {
        let status = output.status;
        match self.classify(output.text) {
            Verdict::Success(text) if self.nonzero_is_test_failure && status != 0 => {
                Verdict::TestFailure(text)
            }
            verdict => verdict,
        }
    }
}
