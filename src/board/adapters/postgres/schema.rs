//! Diesel schema for board workflow persistence.

diesel::table! {
    /// Board records with membership and an optimistic-lock counter.
    boards (id) {
        /// Board identifier.
        id -> Uuid,
        /// Board name.
        #[max_length = 255]
        name -> Varchar,
        /// Creating member.
        creator -> Uuid,
        /// Member set payload.
        members -> Jsonb,
        /// Commit counter bumped on every board-scoped mutation.
        lock_version -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Step (column) records ordered per board.
    steps (id) {
        /// Step identifier.
        id -> Uuid,
        /// Owning board.
        board_id -> Uuid,
        /// Step name.
        #[max_length = 255]
        name -> Varchar,
        /// Optional description.
        description -> Nullable<Text>,
        /// Advisory role classification.
        #[max_length = 20]
        kind -> Varchar,
        /// Optional task capacity.
        capacity -> Nullable<Int4>,
        /// 1-based dense position within the board order.
        position -> Int4,
        /// Terminal marker; at most one per board.
        is_terminal -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Task (card) records ordered per sibling group.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning board.
        board_id -> Uuid,
        /// Owning step; null while unplaced or detached.
        step_id -> Nullable<Uuid>,
        /// Parent task; null for top-level tasks.
        parent_id -> Nullable<Uuid>,
        /// Task name.
        #[max_length = 255]
        name -> Varchar,
        /// Optional description.
        description -> Nullable<Text>,
        /// 1-based dense position within the sibling group.
        position -> Int4,
        /// Assigned member, if any.
        assigned_to -> Nullable<Uuid>,
        /// First-placement timestamp, if set.
        start_date -> Nullable<Timestamptz>,
        /// Finish timestamp, if set.
        finish_date -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(steps -> boards (board_id));
diesel::joinable!(tasks -> steps (step_id));

diesel::allow_tables_to_appear_in_same_query!(boards, steps, tasks);
