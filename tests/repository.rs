use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use homekeep::draft::{DraftDefaults, TaskDraft};
use homekeep::filter::{compare_tasks, visible_tasks, Criteria};
use homekeep::model::{Priority, Recurrence, Task, TaskStatus, TaskType};
use homekeep::repo::{Change, TaskRepository};
use homekeep::storage::{FileStore, LoadOrigin, MemoryStore, Storage};
use homekeep::transfer;

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
}

fn repo_with_clock(store: MemoryStore) -> TaskRepository {
    TaskRepository::open(store)
        .expect("open")
        .with_clock(fixed_now)
}

#[test]
fn upserted_task_survives_reload() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let storage = Storage::new(dir.path());

    let mut repo = TaskRepository::open(storage.file_store())?;
    assert_eq!(repo.load_origin(), LoadOrigin::Created);
    let task = Task::new("Cambiar filtro de agua", "nuestro", repo.now());
    let id = task.id.clone();
    repo.upsert(task.clone())?;
    assert_eq!(repo.get(&id), Some(&task));

    let reopened = TaskRepository::open(FileStore::new(storage.state_file()))?;
    assert_eq!(reopened.load_origin(), LoadOrigin::Loaded);
    assert_eq!(reopened.get(&id), Some(&task));
    Ok(())
}

#[test]
fn upsert_replaces_in_place() -> Result<(), Box<dyn std::error::Error>> {
    let mut repo = repo_with_clock(MemoryStore::new());
    let first = Task::new("uno", "musicala", repo.now());
    let second = Task::new("dos", "musicala", repo.now());
    repo.upsert(first.clone())?;
    repo.upsert(second.clone())?;

    let mut renamed = first.clone();
    renamed.title = "uno bis".to_string();
    repo.upsert(renamed)?;

    let titles: Vec<&str> = repo.tasks().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["uno bis", "dos"]);
    Ok(())
}

#[test]
fn delete_twice_is_a_no_op() -> Result<(), Box<dyn std::error::Error>> {
    let store = MemoryStore::new();
    let mut repo = repo_with_clock(store.clone());
    let task = Task::new("borrar", "musicala", repo.now());
    repo.upsert(task.clone())?;

    assert!(repo.delete(&task.id)?.is_some());
    let snapshot = store.document();
    assert!(repo.delete(&task.id)?.is_none());
    assert_eq!(store.document(), snapshot);
    assert!(repo.get(&task.id).is_none());
    Ok(())
}

#[test]
fn visible_tasks_is_ordered_and_deterministic() {
    let base = fixed_now();
    let mut tasks = Vec::new();
    for (i, status) in [TaskStatus::Done, TaskStatus::Pending, TaskStatus::InProgress]
        .into_iter()
        .cycle()
        .take(12)
        .enumerate()
    {
        let mut task = Task::new(format!("t{i}"), "musicala", base);
        task.status = status;
        task.priority = Priority::clamped(i as i64 % 3 + 1);
        task.updated_at = Some(base + Duration::minutes((i % 4) as i64));
        if i % 5 == 0 {
            task.updated_at = None;
            task.created_at = None;
        }
        tasks.push(task);
    }

    let criteria = Criteria::for_place("musicala");
    let first = visible_tasks(&tasks, &criteria);
    let mut reversed = tasks.clone();
    reversed.reverse();
    let second = visible_tasks(&reversed, &criteria);

    assert_eq!(first.len(), 12);
    assert_eq!(first, second);
    for pair in first.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(a.status.rank() <= b.status.rank());
        if a.status == b.status {
            assert!(a.priority >= b.priority);
            if a.priority == b.priority {
                assert!(a.touched_at() >= b.touched_at());
            }
        }
        assert_ne!(compare_tasks(a, b), std::cmp::Ordering::Greater);
    }
}

#[test]
fn query_is_case_insensitive() {
    let mut task = Task::new("Reponer Shampoo", "musicala", fixed_now());
    task.notes = "marca LOCAL".to_string();
    let tasks = vec![task];

    let mut criteria = Criteria::for_place("musicala");
    for query in ["shampoo", "  SHAMPOO ", "local", "general"] {
        criteria.query = query.to_string();
        assert_eq!(visible_tasks(&tasks, &criteria).len(), 1, "query {query:?}");
    }
    criteria.query = "jabón".to_string();
    assert!(visible_tasks(&tasks, &criteria).is_empty());
}

#[test]
fn recurrence_spawns_exactly_one_successor() -> Result<(), Box<dyn std::error::Error>> {
    let mut repo = repo_with_clock(MemoryStore::new());
    let mut task = Task::new("Comprar papel higiénico", "musicala", repo.now());
    task.recurring = Recurrence::every(21);
    task.due_date = NaiveDate::from_ymd_opt(2024, 1, 10);
    let id = task.id.clone();
    repo.upsert(task)?;

    let outcome = repo.set_status(&id, TaskStatus::Done)?.ok_or("missing task")?;
    let successor = outcome.successor.ok_or("no successor")?;
    assert_ne!(successor.id, id);
    assert_eq!(successor.status, TaskStatus::Pending);
    assert_eq!(successor.due_date, NaiveDate::from_ymd_opt(2024, 1, 31));
    assert_eq!(successor.created_at, Some(fixed_now()));
    assert_eq!(repo.tasks().len(), 2);

    // Completing the same task again while the successor is open adds nothing.
    repo.set_status(&id, TaskStatus::Pending)?;
    let again = repo.set_status(&id, TaskStatus::Done)?.ok_or("missing task")?;
    assert!(again.successor.is_none());

    // done -> done is not a transition into done.
    let repeat = repo.set_status(&id, TaskStatus::Done)?.ok_or("missing task")?;
    assert!(repeat.successor.is_none());
    assert_eq!(repo.tasks().len(), 2);
    Ok(())
}

#[test]
fn non_recurring_completion_spawns_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let mut repo = repo_with_clock(MemoryStore::new());
    let task = Task::new("Arreglar / pintar pared", "casa_cata", repo.now());
    let id = task.id.clone();
    repo.upsert(task)?;

    let outcome = repo.set_status(&id, TaskStatus::Done)?.ok_or("missing task")?;
    assert!(outcome.successor.is_none());
    assert_eq!(repo.tasks().len(), 1);
    Ok(())
}

#[test]
fn change_notifications_follow_commits() -> Result<(), Box<dyn std::error::Error>> {
    let mut repo = repo_with_clock(MemoryStore::new());
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    repo.subscribe(move |change| sink.borrow_mut().push(change.clone()));

    let mut task = Task::new("Regar", "musicala", repo.now());
    task.recurring = Recurrence::every(3);
    let id = task.id.clone();
    repo.upsert(task)?;
    let outcome = repo.set_status(&id, TaskStatus::Done)?.ok_or("missing task")?;
    let successor_id = outcome.successor.ok_or("no successor")?.id;

    let seen = seen.borrow();
    assert_eq!(
        *seen,
        vec![
            Change::Upserted {
                id: id.clone(),
                created: true
            },
            Change::StatusChanged {
                id: id.clone(),
                from: TaskStatus::Pending,
                to: TaskStatus::Done,
            },
            Change::RecurrenceSpawned {
                from: id,
                id: successor_id,
            },
        ]
    );
    Ok(())
}

#[test]
fn import_without_categories_keeps_current_ones() -> Result<(), Box<dyn std::error::Error>> {
    let mut repo = repo_with_clock(MemoryStore::new());
    repo.add_category("Jardín")?;
    repo.upsert(Task::new("viejo", "musicala", repo.now()))?;
    let categories = repo.categories().to_vec();

    let doc = br#"{"version":1,"tasks":[{"id":"t_new","title":"nuevo","placeId":"nuestro"}]}"#;
    let state = transfer::import_document(doc, repo.state())?;
    repo.replace_state(state)?;

    assert_eq!(repo.categories(), categories.as_slice());
    assert_eq!(repo.tasks().len(), 1);
    assert_eq!(repo.tasks()[0].id, "t_new");
    assert_eq!(repo.place_name("nuestro"), "Nuestro espacio (Alek y Cata)");
    Ok(())
}

#[test]
fn imported_duplicate_ids_stay_addressable() -> Result<(), Box<dyn std::error::Error>> {
    let mut repo = repo_with_clock(MemoryStore::new());
    let doc = br#"{"tasks":[
        {"id":"t_x","title":"a","placeId":"musicala"},
        {"id":"t_x","title":"b","placeId":"musicala"}
    ]}"#;
    let state = transfer::import_document(doc, repo.state())?;
    repo.replace_state(state)?;
    assert_eq!(repo.tasks().len(), 2);

    let other = repo
        .tasks()
        .iter()
        .find(|task| task.title == "b")
        .map(|task| task.id.clone())
        .ok_or("second task missing")?;
    assert_ne!(other, "t_x");

    assert!(repo.delete("t_x")?.is_some());
    assert!(repo.get("t_x").is_none());
    assert_eq!(repo.get(&other).map(|task| task.title.as_str()), Some("b"));
    Ok(())
}

#[test]
fn stored_tasks_without_ids_keep_them_across_reopen() -> Result<(), Box<dyn std::error::Error>> {
    let store = MemoryStore::with_document(
        r#"{"tasks":[{"title":"legacy","placeId":"musicala","status":"todo"}]}"#,
    );

    let first = TaskRepository::open(store.clone())?;
    let id = first.tasks()[0].id.clone();

    let mut second = TaskRepository::open(store.clone())?;
    assert_eq!(second.tasks()[0].id, id);
    assert!(second.set_status(&id, TaskStatus::Done)?.is_some());
    Ok(())
}

#[test]
fn end_to_end_recurring_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let now = Utc.with_ymd_and_hms(2024, 2, 1, 18, 0, 0).unwrap();
    let store = MemoryStore::new();
    let mut repo = TaskRepository::open(store.clone())?.with_clock(move || now);
    assert_eq!(repo.places().len(), 4);
    assert!(repo.tasks().is_empty());

    let draft = TaskDraft {
        place_id: Some("musicala".to_string()),
        priority: Some("3".to_string()),
        recurring: Some(true),
        every_days: Some("7".to_string()),
        due_date: Some("2024-02-01".to_string()),
        task_type: Some(TaskType::Improve),
        ..TaskDraft::new("A")
    };
    let task = draft.build(None, &DraftDefaults::default(), repo.now())?;
    let id = task.id.clone();
    repo.upsert(task)?;
    repo.set_status(&id, TaskStatus::Done)?;

    let reopened = TaskRepository::open(store)?;
    let tasks = reopened.tasks();
    assert_eq!(tasks.len(), 2);
    let original = reopened.get(&id).ok_or("original missing")?;
    assert_eq!(original.status, TaskStatus::Done);
    let successor = tasks.iter().find(|t| t.id != id).ok_or("successor missing")?;
    assert_eq!(successor.status, TaskStatus::Pending);
    assert_eq!(successor.due_date, NaiveDate::from_ymd_opt(2024, 2, 8));
    assert_eq!(successor.priority, Priority::High);
    assert_eq!(successor.task_type, TaskType::Improve);
    Ok(())
}
