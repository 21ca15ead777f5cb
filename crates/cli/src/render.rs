use std::collections::HashMap;
use types::{Catalog, Diagnostics, SolveParams, TimetableResult};

pub fn diagnostics(diag: &Diagnostics) {
    println!(
        "Catalog: {} courses ({} schedulable per class cap), {} slots, {} rooms",
        diag.total_courses, diag.capped_courses, diag.slot_count, diag.room_count
    );
    for (class, count) in &diag.per_class {
        println!("  Class Level {class}: {count} courses");
    }
    if !diag.busy_teachers.is_empty() {
        println!("Teachers with more than one course:");
        for (teacher, count) in &diag.busy_teachers {
            println!("  {teacher}: {count}");
        }
    }
}

pub fn report(catalog: &Catalog, params: &SolveParams, result: &TimetableResult) {
    println!(
        "\nPhase 1 ({}): scheduled {}/{} courses in {:.2?}",
        result.phase1.status, result.phase1.scheduled, result.phase1.total, result.phase1.elapsed
    );
    match &result.phase2 {
        Some(p2) => println!(
            "Phase 2 ({}): morning score {} in {:.2?}",
            p2.status, p2.objective, p2.elapsed
        ),
        None => println!("Phase 2 skipped: nothing scheduled"),
    }

    let names: HashMap<(&str, &str), &str> = catalog
        .courses()
        .map(|(class, course)| {
            (
                (class.0.as_str(), course.code.0.as_str()),
                course.name.as_str(),
            )
        })
        .collect();

    println!("\nTimetable Generated:");
    let mut current_class = None;
    for a in &result.assignments {
        if current_class != Some(&a.class) {
            println!("\nClass Level {}:", a.class);
            current_class = Some(&a.class);
        }
        let name = names
            .get(&(a.class.0.as_str(), a.course.0.as_str()))
            .copied()
            .unwrap_or("");
        println!(
            "  {} {name}: {} {}, Room {}, {}",
            a.course,
            params.day_names[a.slot.day as usize],
            params.period_labels[a.slot.period as usize],
            a.room,
            a.teacher
        );
    }

    if !result.unscheduled.is_empty() {
        println!("\nUnscheduled courses:");
        for u in &result.unscheduled {
            println!(
                "  [{}] {} {} ({}): {}",
                u.class, u.course, u.name, u.teacher, u.reason
            );
        }
    }

    if !result.usage.is_empty() {
        println!("\nSlot usage:");
        for usage in &result.usage {
            let rooms: Vec<&str> = usage.rooms.iter().map(|r| r.0.as_str()).collect();
            println!(
                "  {} {}: {} class(es), rooms [{}]",
                params.day_names[usage.slot.day as usize],
                params.period_labels[usage.slot.period as usize],
                usage.classes_active,
                rooms.join(", ")
            );
        }
    }

    println!("\nTotal morning score: {}", result.morning_score);
}
