use serde::Serialize;

use crate::model::question::CourseCode;

/// Number of questions drawn for one test.
pub const DEFAULT_SESSION_SIZE: usize = 30;

/// Rows requested from the question table before sampling.
pub const DEFAULT_POOL_LIMIT: usize = 50;

/// A course students can take a test in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Course {
    code: CourseCode,
    name: &'static str,
    title: &'static str,
    description: &'static str,
    topics: &'static [&'static str],
    question_count: usize,
    duration_minutes: u32,
}

impl Course {
    #[must_use]
    pub fn code(&self) -> &CourseCode {
        &self.code
    }

    /// Short display name, e.g. "Computer Architecture".
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn title(&self) -> &'static str {
        self.title
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Focus topics advertised for the course. Informational only.
    #[must_use]
    pub fn topics(&self) -> &'static [&'static str] {
        self.topics
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.question_count
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }
}

struct CourseEntry {
    code: &'static str,
    name: &'static str,
    title: &'static str,
    description: &'static str,
    topics: &'static [&'static str],
}

const BUILTIN: &[CourseEntry] = &[
    CourseEntry {
        code: "IFT212.2",
        name: "Computer Architecture",
        title: "IFT 212.2 - Computer Architecture",
        description: "Master flip-flops, modulation, and computer system fundamentals",
        topics: &[
            "Flip-Flops (SR, D, JK, T)",
            "Modulation & Demodulation",
            "Computer Systems",
        ],
    },
    CourseEntry {
        code: "IFT235.2",
        name: "Mobile App Performance",
        title: "IFT 235.2 - Mobile App Performance",
        description: "Optimize mobile apps with KPIs, network efficiency, and data processing",
        topics: &["KPIs & Metrics", "Network Optimization", "Data Processing"],
    },
];

/// Read-only course listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseCatalog {
    courses: Vec<Course>,
}

impl CourseCatalog {
    /// The hardcoded catalog shipped with the application.
    #[must_use]
    pub fn builtin() -> Self {
        let courses = BUILTIN
            .iter()
            .filter_map(|entry| {
                let code = CourseCode::new(entry.code).ok()?;
                Some(Course {
                    code,
                    name: entry.name,
                    title: entry.title,
                    description: entry.description,
                    topics: entry.topics,
                    question_count: DEFAULT_SESSION_SIZE,
                    duration_minutes: 45,
                })
            })
            .collect();
        Self { courses }
    }

    #[must_use]
    pub fn get(&self, code: &CourseCode) -> Option<&Course> {
        self.courses.iter().find(|c| c.code() == code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Course> {
        self.courses.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.courses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

impl Default for CourseCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_lists_both_courses_in_order() {
        let catalog = CourseCatalog::builtin();
        let codes: Vec<_> = catalog.iter().map(|c| c.code().as_str()).collect();
        assert_eq!(codes, ["IFT212.2", "IFT235.2"]);
    }

    #[test]
    fn lookup_by_code() {
        let catalog = CourseCatalog::builtin();
        let course = catalog.get(&CourseCode::new("IFT235.2").unwrap()).unwrap();
        assert_eq!(course.name(), "Mobile App Performance");
        assert_eq!(course.question_count(), 30);
        assert_eq!(course.duration_minutes(), 45);
        assert_eq!(course.topics().len(), 3);

        assert!(catalog.get(&CourseCode::new("IFT999.9").unwrap()).is_none());
    }
}
