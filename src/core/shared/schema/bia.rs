diesel::table! {
    organization_settings (id) {
        id -> Uuid,
        org_id -> Uuid,
        weight_reputation -> Int4,
        weight_external -> Int4,
        weight_internal -> Int4,
        weight_legal -> Int4,
        weight_economic -> Int4,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    bia_processes (id) {
        id -> Uuid,
        org_id -> Uuid,
        name -> Varchar,
        description -> Nullable<Text>,
        owner -> Nullable<Varchar>,
        impact_reputation -> Int4,
        impact_external -> Int4,
        impact_internal -> Int4,
        impact_legal -> Int4,
        impact_economic -> Int4,
        criticality_score -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    information_assets (id) {
        id -> Uuid,
        org_id -> Uuid,
        process_id -> Uuid,
        name -> Varchar,
        asset_type -> Nullable<Varchar>,
        description -> Nullable<Text>,
        c_rating -> Int4,
        i_rating -> Int4,
        a_rating -> Int4,
        security_level -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(information_assets -> bia_processes (process_id));
