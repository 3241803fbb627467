use crate::roster::{Session, StudentRecord};

/// Department columns, in assignment order. A group seats at most one
/// department per column.
pub const COLUMN_LETTERS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];
pub const ROWS_PER_CLASSROOM: u32 = 6;
pub const FIRST_CLASSROOM_NUMBER: u32 = 101;

/// The persisted entity. Natural key: (register_number, exam_date, session).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatAssignment {
    pub register_number: String,
    pub name: String,
    pub department: String,
    pub subject: String,
    pub class_room: String,
    pub seat_number: String,
    pub exam_date: String,
    pub session: Session,
}

/// Departments past the sixth in one (exam_date, session) group. Their
/// students get no seats; the condition is reported, not fatal.
#[derive(Debug, Clone)]
pub struct UnseatedGroup {
    pub exam_date: String,
    pub session: Session,
    pub departments: Vec<String>,
    pub student_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct AllocationOutcome {
    pub assignments: Vec<SeatAssignment>,
    pub unseated: Vec<UnseatedGroup>,
}

/// Assigns seats to the given records, deterministically for a fixed input
/// ordering.
///
/// Records are stably sorted by register number, partitioned by
/// (exam_date, session) in first-seen order, then by department in
/// first-seen order within each group. The first six departments map to
/// columns A-F; seats fill row-major, one student per active column per
/// row, overflowing into sequentially numbered classrooms of
/// `ROWS_PER_CLASSROOM` rows each.
pub fn allocate_seats(mut records: Vec<StudentRecord>) -> AllocationOutcome {
    records.sort_by(|a, b| a.register_number.cmp(&b.register_number));

    // Column assignment depends on first-seen order, so grouping must be
    // insertion-ordered rather than map-ordered.
    let mut group_keys: Vec<(String, Session)> = Vec::new();
    let mut groups: Vec<Vec<StudentRecord>> = Vec::new();
    for rec in records {
        let key = (rec.exam_date.clone(), rec.session);
        match group_keys.iter().position(|k| *k == key) {
            Some(i) => groups[i].push(rec),
            None => {
                group_keys.push(key);
                groups.push(vec![rec]);
            }
        }
    }

    let mut outcome = AllocationOutcome::default();
    for ((exam_date, session), group) in group_keys.into_iter().zip(groups) {
        allocate_group(exam_date, session, group, &mut outcome);
    }
    outcome
}

fn allocate_group(
    exam_date: String,
    session: Session,
    group: Vec<StudentRecord>,
    outcome: &mut AllocationOutcome,
) {
    let mut dept_names: Vec<String> = Vec::new();
    let mut dept_members: Vec<Vec<StudentRecord>> = Vec::new();
    for rec in group {
        match dept_names.iter().position(|d| *d == rec.department) {
            Some(i) => dept_members[i].push(rec),
            None => {
                dept_names.push(rec.department.clone());
                dept_members.push(vec![rec]);
            }
        }
    }

    if dept_names.len() > COLUMN_LETTERS.len() {
        let extra_names = dept_names.split_off(COLUMN_LETTERS.len());
        let extra_members = dept_members.split_off(COLUMN_LETTERS.len());
        outcome.unseated.push(UnseatedGroup {
            exam_date: exam_date.clone(),
            session,
            student_count: extra_members.iter().map(|m| m.len()).sum(),
            departments: extra_names,
        });
    }

    let max_in_column = dept_members.iter().map(|m| m.len()).max().unwrap_or(0);

    let mut row_counter: u32 = 1;
    let mut class_counter: u32 = FIRST_CLASSROOM_NUMBER;

    for row in 0..max_in_column {
        for (col, members) in dept_members.iter().enumerate() {
            let Some(student) = members.get(row) else {
                // Sparse column: the seat stays empty, column identity wins
                // over density.
                continue;
            };
            outcome.assignments.push(SeatAssignment {
                register_number: student.register_number.clone(),
                name: student.name.clone(),
                department: student.department.clone(),
                subject: student.subject.clone(),
                class_room: format!("Room {}", class_counter),
                seat_number: format!("{}{}", COLUMN_LETTERS[col], row_counter),
                exam_date: exam_date.clone(),
                session,
            });
        }

        row_counter += 1;
        if row_counter > ROWS_PER_CLASSROOM {
            row_counter = 1;
            class_counter += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn rec(register: &str, dept: &str) -> StudentRecord {
        StudentRecord {
            register_number: register.to_string(),
            name: format!("Student {}", register),
            department: dept.to_string(),
            exam_date: "2024-05-01".to_string(),
            session: Session::Forenoon,
            subject: "Algorithms".to_string(),
        }
    }

    #[test]
    fn two_departments_take_adjacent_columns_in_room_101() {
        let outcome = allocate_seats(vec![rec("REG001", "CS"), rec("REG002", "EC")]);
        assert_eq!(outcome.assignments.len(), 2);
        let a = &outcome.assignments[0];
        let b = &outcome.assignments[1];
        assert_eq!((a.class_room.as_str(), a.seat_number.as_str()), ("Room 101", "A1"));
        assert_eq!((b.class_room.as_str(), b.seat_number.as_str()), ("Room 101", "B1"));
        assert_eq!(a.register_number, "REG001");
        assert_eq!(b.register_number, "REG002");
    }

    #[test]
    fn seats_are_unique_within_a_classroom() {
        let mut records = Vec::new();
        for d in 0..4 {
            for i in 0..11 {
                records.push(rec(&format!("R{}{:03}", d, i), &format!("D{}", d)));
            }
        }
        let outcome = allocate_seats(records);
        let mut seen = HashSet::new();
        for a in &outcome.assignments {
            assert!(
                seen.insert((a.class_room.clone(), a.seat_number.clone())),
                "duplicate seat {} in {}",
                a.seat_number,
                a.class_room
            );
        }
    }

    #[test]
    fn balanced_36_students_fill_exactly_one_room() {
        let mut records = Vec::new();
        for d in 0..6 {
            for i in 0..6 {
                records.push(rec(&format!("R{}{:03}", d, i), &format!("D{}", d)));
            }
        }
        let outcome = allocate_seats(records);
        assert_eq!(outcome.assignments.len(), 36);
        let rooms: HashSet<_> = outcome.assignments.iter().map(|a| &a.class_room).collect();
        assert_eq!(rooms.len(), 1);
    }

    #[test]
    fn thirty_seventh_student_opens_a_second_room() {
        let mut records = Vec::new();
        for d in 0..6 {
            for i in 0..6 {
                records.push(rec(&format!("R{}{:03}", d, i), &format!("D{}", d)));
            }
        }
        // "R0006" sorts after the other D0 registers, so it lands in the
        // seventh row of column A.
        records.push(rec("R0006", "D0"));
        let outcome = allocate_seats(records);
        assert_eq!(outcome.assignments.len(), 37);
        let rooms: HashSet<_> = outcome
            .assignments
            .iter()
            .map(|a| a.class_room.clone())
            .collect();
        assert_eq!(rooms.len(), 2);
        let in_second: Vec<_> = outcome
            .assignments
            .iter()
            .filter(|a| a.class_room == "Room 102")
            .collect();
        assert_eq!(in_second.len(), 1);
        assert_eq!(in_second[0].seat_number, "A1");
    }

    #[test]
    fn seventh_department_is_unseated_with_a_count() {
        let mut records = Vec::new();
        for d in 0..7 {
            records.push(rec(&format!("R{:03}", d), &format!("D{}", d)));
        }
        records.push(rec("R900", "D6"));
        let outcome = allocate_seats(records);
        assert_eq!(outcome.assignments.len(), 6);
        assert_eq!(outcome.unseated.len(), 1);
        let u = &outcome.unseated[0];
        assert_eq!(u.departments, vec!["D6".to_string()]);
        assert_eq!(u.student_count, 2);
        assert!(outcome
            .assignments
            .iter()
            .all(|a| a.department != "D6"));
    }

    #[test]
    fn groups_are_keyed_by_date_and_session() {
        let mut fore = rec("REG001", "CS");
        fore.session = Session::Forenoon;
        let mut aft = rec("REG002", "CS");
        aft.session = Session::Afternoon;
        let outcome = allocate_seats(vec![fore, aft]);
        // Each group restarts at Room 101, seat A1.
        assert_eq!(outcome.assignments.len(), 2);
        assert!(outcome
            .assignments
            .iter()
            .all(|a| a.class_room == "Room 101" && a.seat_number == "A1"));
    }

    #[test]
    fn allocation_is_deterministic_regardless_of_input_order() {
        let records: Vec<_> = (0..20)
            .map(|i| rec(&format!("R{:03}", i), if i % 2 == 0 { "CS" } else { "EC" }))
            .collect();
        let mut shuffled = records.clone();
        shuffled.reverse();
        let a = allocate_seats(records);
        let b = allocate_seats(shuffled);
        assert_eq!(a.assignments, b.assignments);
    }

    #[test]
    fn no_records_no_assignments() {
        let outcome = allocate_seats(Vec::new());
        assert!(outcome.assignments.is_empty());
        assert!(outcome.unseated.is_empty());
    }

    #[test]
    fn sparse_column_leaves_rows_empty_without_backfill() {
        let mut records = Vec::new();
        for i in 0..3 {
            records.push(rec(&format!("RA{:03}", i), "CS"));
        }
        records.push(rec("RB000", "EC"));
        let outcome = allocate_seats(records);
        let ec: Vec<_> = outcome
            .assignments
            .iter()
            .filter(|a| a.department == "EC")
            .collect();
        assert_eq!(ec.len(), 1);
        // EC stays in column B even though column A runs three rows deep.
        assert_eq!(ec[0].seat_number, "B1");
    }
}
