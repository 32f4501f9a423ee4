use tasklist_core::Task;

/// Case-insensitive substring search over task text. A blank query keeps everything.
pub fn filter_tasks<'a>(tasks: &'a [Task], query: &str) -> Vec<&'a Task> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return tasks.iter().collect();
    }
    tasks
        .iter()
        .filter(|task| task.text.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::filter_tasks;
    use tasklist_core::Task;

    #[test]
    fn matches_case_insensitively_and_keeps_order() {
        let tasks = vec![
            Task::with_id("1", "u1", "Buy Milk", 3),
            Task::with_id("2", "u1", "call mom", 2),
            Task::with_id("3", "u1", "milkshake", 1),
        ];
        let ids: Vec<_> = filter_tasks(&tasks, "MILK").iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);
        assert_eq!(filter_tasks(&tasks, "  ").len(), 3);
        assert!(filter_tasks(&tasks, "dentist").is_empty());
    }
}
