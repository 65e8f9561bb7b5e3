pub(crate) mod enrollment_workflow;
pub(crate) mod exam_links;
pub(crate) mod grading;
