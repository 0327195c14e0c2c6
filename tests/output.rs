use homekeep::output::{format_human, HumanOutput};

#[test]
fn format_human_includes_sections() {
    let mut human = HumanOutput::new("Task created");
    human.push_summary("ID", "t_01hx");
    human.push_detail("bisagra suelta");
    human.push_warning("stored data was unreadable");
    human.push_next_step("homekeep done t_01hx");

    let rendered = format_human(&human);
    assert!(rendered.contains("Task created"));
    assert!(rendered.contains("Summary:"));
    assert!(rendered.contains("- ID: t_01hx"));
    assert!(rendered.contains("Details:"));
    assert!(rendered.contains("- bisagra suelta"));
    assert!(rendered.contains("Warnings:"));
    assert!(rendered.contains("- stored data was unreadable"));
    assert!(rendered.contains("Next steps:"));
    assert!(rendered.contains("- homekeep done t_01hx"));
}

#[test]
fn format_human_omits_empty_sections() {
    let human = HumanOutput::new("Categories");
    let rendered = format_human(&human);
    assert_eq!(rendered, "Categories");
}
