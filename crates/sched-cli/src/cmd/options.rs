use crate::output::{print_json, print_table};
use sched_core::options::{list_cluster_options, ClusterOption, OptionKind, OptionOutput};
use serde::Serialize;

fn kind_label(kind: OptionKind) -> String {
    match kind {
        OptionKind::Boolean => "boolean".to_string(),
        OptionKind::Integer => "integer".to_string(),
        OptionKind::Duration => "duration".to_string(),
        OptionKind::Enum(values) => format!("select ({})", values.join("|")),
        OptionKind::String => "string".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

#[derive(Default)]
struct TableOutput {
    heading: String,
    rows: Vec<Vec<String>>,
}

impl OptionOutput for TableOutput {
    fn begin_list(&mut self, name: &str, short_description: &str, _long: &str) {
        self.heading = format!("{name}: {short_description}");
    }

    fn option(&mut self, option: &ClusterOption) {
        self.rows.push(vec![
            option.name.to_string(),
            kind_label(option.kind),
            option.default.to_string(),
            option.short_description.to_string(),
        ]);
    }

    fn end_list(&mut self) {
        println!("{}\n", self.heading);
        print_table(
            &["NAME", "TYPE", "DEFAULT", "DESCRIPTION"],
            std::mem::take(&mut self.rows),
        );
    }
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[derive(Default, Serialize)]
struct OptionList {
    name: String,
    short_description: String,
    long_description: String,
    options: Vec<ClusterOption>,
}

impl OptionOutput for OptionList {
    fn begin_list(&mut self, name: &str, short_description: &str, long_description: &str) {
        self.name = name.to_string();
        self.short_description = short_description.to_string();
        self.long_description = long_description.to_string();
    }

    fn option(&mut self, option: &ClusterOption) {
        self.options.push(*option);
    }

    fn end_list(&mut self) {}
}

pub fn run(json: bool) -> anyhow::Result<()> {
    if json {
        let mut list = OptionList::default();
        list_cluster_options(&mut list);
        return print_json(&list);
    }

    list_cluster_options(&mut TableOutput::default());
    Ok(())
}
