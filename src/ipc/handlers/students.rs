use crate::ipc::error::{fail, ok};
use crate::ipc::helpers::required_id;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.store.list_ids() {
        Ok(ids) => ok(&req.id, json!({ "studentIds": ids })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_students_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_id(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match state.store.find_by_id(&student_id) {
        Ok(record) => {
            state.session.select_student(&record);
            let previous_grade = record.grade.clone();
            let already_marked = previous_grade.is_some();
            ok(
                &req.id,
                json!({
                    "student": record,
                    "alreadyMarked": already_marked,
                    "previousGrade": previous_grade,
                    "status": state.session.status(),
                }),
            )
        }
        Err(e) => {
            // A failed lookup must not leave the previous student's details on the form.
            state.session.clear_student();
            fail(&req.id, &e)
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.select" => Some(handle_students_select(state, req)),
        _ => None,
    }
}
