use chrono::{Duration, TimeZone, Utc};

use taskdesk::model::{Priority, Role, Task, TaskFilter, TaskStatus, User};
use taskdesk::views::{
    self, apply_filter, is_deadline_approaching, is_deadline_past, sort_tasks, DashboardSummary,
    SortOrder,
};

fn task(id: &str, priority: Priority, status: TaskStatus) -> Task {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    Task {
        id: id.to_string(),
        title: format!("Task {id}"),
        description: String::new(),
        status,
        priority,
        assignee_id: "emp".to_string(),
        assignee_name: "Emp".to_string(),
        created_by_id: "boss".to_string(),
        created_by_name: "Boss".to_string(),
        deadline: base + Duration::days(3),
        created_at: base,
        updated_at: base,
        comments: Vec::new(),
    }
}

fn ids(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|t| t.id.as_str()).collect()
}

#[test]
fn priority_sort_is_stable_high_to_low() {
    let mut tasks = vec![
        task("low", Priority::Low, TaskStatus::Pending),
        task("high-1", Priority::High, TaskStatus::Pending),
        task("medium", Priority::Medium, TaskStatus::Pending),
        task("high-2", Priority::High, TaskStatus::Pending),
    ];
    sort_tasks(&mut tasks, SortOrder::Priority);
    assert_eq!(ids(&tasks), vec!["high-1", "high-2", "medium", "low"]);
}

#[test]
fn newest_oldest_and_deadline_sorts() {
    let mut a = task("a", Priority::Low, TaskStatus::Pending);
    let mut b = task("b", Priority::Low, TaskStatus::Pending);
    let c = task("c", Priority::Low, TaskStatus::Pending);
    a.created_at -= Duration::days(2);
    b.created_at += Duration::days(1);
    a.deadline += Duration::days(10);
    b.deadline -= Duration::days(1);

    let tasks = vec![a, b, c];
    assert_eq!(ids(&views::sorted(&tasks, SortOrder::Newest)), vec!["b", "c", "a"]);
    assert_eq!(ids(&views::sorted(&tasks, SortOrder::Oldest)), vec!["a", "c", "b"]);
    assert_eq!(ids(&views::sorted(&tasks, SortOrder::Deadline)), vec!["b", "c", "a"]);
}

#[test]
fn deadline_past_is_strict() {
    let now = Utc::now();
    assert!(is_deadline_past(now - Duration::milliseconds(1), now));
    assert!(!is_deadline_past(now + Duration::milliseconds(1), now));
    assert!(!is_deadline_past(now, now));
}

#[test]
fn deadline_approaching_window_edges() {
    let now = Utc::now();
    assert!(is_deadline_approaching(now + Duration::days(2), now));
    assert!(!is_deadline_approaching(
        now + Duration::days(2) + Duration::seconds(1),
        now
    ));
    assert!(!is_deadline_approaching(now - Duration::seconds(1), now));
    assert!(is_deadline_approaching(now + Duration::hours(1), now));
}

#[test]
fn search_is_case_insensitive_on_title_or_description() {
    let mut ship = task("ship", Priority::High, TaskStatus::Pending);
    ship.title = "Ship it".to_string();
    let mut blocker = task("blocker", Priority::High, TaskStatus::Pending);
    blocker.description = "blocks the SHIPment".to_string();
    let other = task("other", Priority::High, TaskStatus::Pending);
    let tasks = vec![ship, blocker, other];

    for needle in ["sh", "SHIP"] {
        let filter = TaskFilter {
            search: Some(needle.to_string()),
            ..TaskFilter::default()
        };
        let found = apply_filter(&tasks, &filter, None);
        assert_eq!(ids(&found), vec!["ship", "blocker"], "needle {needle}");
    }
}

#[test]
fn dashboard_summary_for_admin_and_employee() {
    let now = Utc::now();
    let mut overdue = task("overdue", Priority::High, TaskStatus::Pending);
    overdue.deadline = now - Duration::hours(3);
    let mut soon = task("soon", Priority::Medium, TaskStatus::InProgress);
    soon.deadline = now + Duration::hours(20);
    let mut done = task("done", Priority::Low, TaskStatus::Completed);
    done.deadline = now - Duration::days(1);
    done.updated_at = now;

    let tasks = vec![overdue, soon, done];
    let admin = User {
        id: "boss".into(),
        name: "Boss".into(),
        email: "boss@example.com".into(),
        role: Role::Admin,
        avatar: None,
    };
    let emp = User {
        id: "emp".into(),
        name: "Emp".into(),
        email: "emp@example.com".into(),
        role: Role::Employee,
        avatar: None,
    };
    let users = vec![admin.clone(), emp.clone()];

    let summary = DashboardSummary::build(&tasks, &users, &admin, now, Duration::days(2));
    assert_eq!(summary.total_tasks, 3);
    assert_eq!(summary.by_status.get(&TaskStatus::Completed), 1);
    assert_eq!(summary.overdue, vec!["overdue".to_string()]);
    assert_eq!(summary.approaching, vec!["soon".to_string()]);
    assert_eq!(summary.completed_today, 1);
    assert_eq!(summary.recent.len(), 3);
    let employees = summary.employees.expect("admin sees workload");
    assert_eq!(employees.len(), 1);
    assert_eq!(employees[0].productivity_rate, 33);

    let mine = DashboardSummary::build(&tasks, &users, &emp, now, Duration::days(2));
    assert_eq!(mine.assigned_to_viewer, 3);
    assert!(mine.employees.is_none());
}
