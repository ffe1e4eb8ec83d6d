diesel::table! {
    organizations (org_id) {
        org_id -> Uuid,
        name -> Text,
        slug -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    change_history (id) {
        id -> Uuid,
        org_id -> Uuid,
        entity_type -> Varchar,
        entity_id -> Varchar,
        action -> Varchar,
        changes -> Jsonb,
        user_id -> Nullable<Uuid>,
        user_name -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}
