//! GraphQL documents sent by [`GraphQlClient`](super::GraphQlClient).

const EXERCISE_FIELDS: &str = "uid workout_uid title weight weight_unit sets reps reps_display comment start_time end_time";

macro_rules! document {
    ($($part:expr),+ $(,)?) => {
        [$($part),+].concat()
    };
}

pub fn users() -> String {
    "query Users { users { uid first_name last_name email is_authorized created_at } }".to_string()
}

pub fn user() -> String {
    document!(
        "query User($uid: ID!) { user(uid: $uid) { uid first_name last_name email is_authorized created_at ",
        "workouts { uid user_uid start_time end_time comment exercises { ",
        EXERCISE_FIELDS,
        " } } } }",
    )
}

pub fn workouts() -> String {
    document!(
        "query Workouts { workouts { uid user_uid start_time end_time comment exercises { ",
        EXERCISE_FIELDS,
        " } } }",
    )
}

pub fn workout() -> String {
    document!(
        "query Workout($uid: ID!) { workout(uid: $uid) { uid user_uid start_time end_time comment exercises { ",
        EXERCISE_FIELDS,
        " } } }",
    )
}

pub fn exercises() -> String {
    document!("query Exercises { exercises { ", EXERCISE_FIELDS, " } }")
}

pub fn exercise() -> String {
    document!(
        "query Exercise($uid: ID!) { exercise(uid: $uid) { ",
        EXERCISE_FIELDS,
        " } }",
    )
}

pub fn add_user() -> String {
    "mutation AddUser($user: AddUserInput!) { addUser(user: $user) { uid first_name last_name email is_authorized created_at } }".to_string()
}

pub fn update_user() -> String {
    "mutation UpdateUser($uid: ID!, $edits: EditUserInput!) { updateUser(uid: $uid, edits: $edits) { uid first_name last_name email is_authorized created_at } }".to_string()
}

pub fn delete_user() -> String {
    "mutation DeleteUser($uid: ID!) { deleteUser(uid: $uid) { uid first_name last_name } }".to_string()
}

pub fn add_workout() -> String {
    "mutation AddWorkout($user_uid: ID!, $workout: AddOrEditWorkoutInput!) { addWorkout(user_uid: $user_uid, workout: $workout) { uid user_uid start_time end_time comment } }".to_string()
}

pub fn update_workout() -> String {
    "mutation UpdateWorkout($uid: ID!, $edits: AddOrEditWorkoutInput!) { updateWorkout(uid: $uid, edits: $edits) { uid user_uid start_time end_time comment } }".to_string()
}

pub fn delete_workout() -> String {
    "mutation DeleteWorkout($uid: ID!) { deleteWorkout(uid: $uid) { uid } }".to_string()
}

pub fn add_exercise() -> String {
    document!(
        "mutation AddExercise($workout_uid: ID!, $exercise: AddExerciseInput!) { addExercise(workout_uid: $workout_uid, exercise: $exercise) { ",
        EXERCISE_FIELDS,
        " } }",
    )
}

pub fn update_exercise() -> String {
    document!(
        "mutation UpdateExercise($uid: ID!, $edits: EditExerciseInput!) { updateExercise(uid: $uid, edits: $edits) { ",
        EXERCISE_FIELDS,
        " } }",
    )
}

pub fn delete_exercise() -> String {
    "mutation DeleteExercise($uid: ID!) { deleteExercise(uid: $uid) { uid title } }".to_string()
}
