//! Built-in starter tasks ("quick templates")

use chrono::{DateTime, Utc};

use crate::model::{Priority, Recurrence, Task, TaskType};

#[derive(Debug, Clone, Copy)]
pub struct Template {
    pub title: &'static str,
    pub task_type: TaskType,
    pub category: &'static str,
    pub priority: Priority,
    pub every_days: Option<u16>,
}

pub const TEMPLATES: [Template; 7] = [
    Template {
        title: "Reponer shampoo",
        task_type: TaskType::Restock,
        category: "Baño",
        priority: Priority::Medium,
        every_days: None,
    },
    Template {
        title: "Comprar papel higiénico",
        task_type: TaskType::Restock,
        category: "Baño",
        priority: Priority::Medium,
        every_days: Some(21),
    },
    Template {
        title: "Revisar bombillos",
        task_type: TaskType::Improve,
        category: "General",
        priority: Priority::Low,
        every_days: Some(60),
    },
    Template {
        title: "Arreglar / pintar pared",
        task_type: TaskType::Repair,
        category: "General",
        priority: Priority::High,
        every_days: None,
    },
    Template {
        title: "Comprar extensiones/cables",
        task_type: TaskType::Buy,
        category: "Herramientas",
        priority: Priority::Medium,
        every_days: None,
    },
    Template {
        title: "Arena / comida mascotas",
        task_type: TaskType::Restock,
        category: "Mascotas",
        priority: Priority::Medium,
        every_days: Some(15),
    },
    Template {
        title: "Limpieza profunda cocina",
        task_type: TaskType::Improve,
        category: "Cocina",
        priority: Priority::Low,
        every_days: Some(30),
    },
];

impl Template {
    pub fn instantiate(&self, place_id: &str, now: DateTime<Utc>) -> Task {
        let mut task = Task::new(self.title, place_id, now);
        task.task_type = self.task_type;
        task.category = self.category.to_string();
        task.priority = self.priority;
        task.recurring = match self.every_days {
            Some(days) => Recurrence::every(i64::from(days)),
            None => Recurrence::default(),
        };
        task
    }
}

/// Template tasks for `place_id` that are not already open there.
///
/// Titles are compared case-insensitively against non-done tasks.
pub fn missing_templates(existing: &[Task], place_id: &str, now: DateTime<Utc>) -> Vec<Task> {
    TEMPLATES
        .iter()
        .filter(|template| {
            let title = template.title.to_lowercase();
            !existing.iter().any(|task| {
                task.place_id == place_id && !task.is_done() && task.title.to_lowercase() == title
            })
        })
        .map(|template| template.instantiate(place_id, now))
        .collect()
}
