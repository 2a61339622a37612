//! Diesel schema for task record persistence.

diesel::table! {
    /// Status ledger, one row per logical task.
    tasks (task_id) {
        /// External task identifier, unique per logical task.
        task_id -> Uuid,
        /// Message identifier of the delivery that created the row.
        #[max_length = 255]
        message_id -> Nullable<Varchar>,
        /// Task lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Redelivery count.
        retry_count -> Int4,
        /// Processing duration of the latest terminal attempt, in seconds.
        processing_time_seconds -> Nullable<Double>,
        /// Failure reason of the latest failed attempt.
        error_message -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Origin metadata, written once at first creation.
    task_metadata (task_id) {
        /// External task identifier, 1:1 with `tasks`.
        task_id -> Uuid,
        /// Identifier of the initiating user or system.
        initiated_by -> Uuid,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(task_metadata -> tasks (task_id));
diesel::allow_tables_to_appear_in_same_query!(tasks, task_metadata);
