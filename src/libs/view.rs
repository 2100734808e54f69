use super::task::Task;
use anyhow::Result;
use prettytable::{row, Table};

/// One container as shown by `boardsync show`.
#[derive(Debug, Clone)]
pub struct ContainerSection {
    pub title: String,
    pub wip_limit: Option<u32>,
    /// Members in display order.
    pub tasks: Vec<Task>,
}

impl ContainerSection {
    fn heading(&self) -> String {
        match self.wip_limit {
            Some(limit) => format!("{} ({}/{})", self.title, self.tasks.len(), limit),
            None => format!("{} ({})", self.title, self.tasks.len()),
        }
    }
}

pub struct View {}

impl View {
    pub fn board_table(sections: &[ContainerSection]) -> Table {
        let mut table = Table::new();

        table.add_row(row!["CONTAINER", "#", "ID", "TASK", "PARENT", "POSITION"]);
        for section in sections {
            if section.tasks.is_empty() {
                table.add_row(row![section.heading(), "", "", "", "", ""]);
                continue;
            }
            for (index, task) in section.tasks.iter().enumerate() {
                let heading = if index == 0 { section.heading() } else { String::new() };
                table.add_row(row![
                    heading,
                    index,
                    task.id,
                    task.title,
                    task.parent_id.map(|id| id.to_string()).unwrap_or_default(),
                    format!("{:.3}", task.position)
                ]);
            }
        }

        table
    }

    pub fn board(sections: &[ContainerSection]) -> Result<()> {
        Self::board_table(sections).printstd();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_shows_occupancy_against_limit() {
        let section = ContainerSection {
            title: "Doing".to_string(),
            wip_limit: Some(2),
            tasks: Vec::new(),
        };
        assert_eq!(section.heading(), "Doing (0/2)");

        let table = View::board_table(&[section]);
        assert_eq!(table.len(), 2);
    }
}
