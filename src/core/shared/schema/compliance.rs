diesel::table! {
    controls (id) {
        id -> Int4,
        control_code -> Varchar,
        domain_code -> Varchar,
        domain -> Varchar,
        domain_objective -> Nullable<Text>,
        section -> Nullable<Varchar>,
        control_statement -> Nullable<Text>,
        control_summary -> Nullable<Text>,
        control_description -> Nullable<Text>,
        is_baseline -> Bool,
        is_applicable -> Bool,
        type_deter -> Bool,
        type_avoid -> Bool,
        type_prevent -> Bool,
        type_detect -> Bool,
        type_react -> Bool,
        type_recover -> Bool,
        objective_confidentiality -> Bool,
        objective_integrity -> Bool,
        objective_availability -> Bool,
        iso27001_2013 -> Nullable<Varchar>,
        pci_dss_v31 -> Nullable<Varchar>,
        sp_800_53_rev4 -> Nullable<Varchar>,
    }
}

diesel::table! {
    evaluations (id) {
        id -> Uuid,
        org_id -> Uuid,
        control_id -> Int4,
        status -> Varchar,
        is_applicable -> Nullable<Bool>,
        feedback -> Nullable<Text>,
        auditor_id -> Nullable<Uuid>,
        evaluated_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    evidence (id) {
        id -> Uuid,
        evaluation_id -> Uuid,
        file_name -> Varchar,
        file_path -> Text,
        file_type -> Varchar,
        file_size -> Int8,
        uploaded_by -> Nullable<Uuid>,
        uploaded_at -> Timestamptz,
    }
}

diesel::table! {
    comments (id) {
        id -> Uuid,
        evaluation_id -> Uuid,
        user_id -> Uuid,
        user_name -> Nullable<Varchar>,
        user_role -> Nullable<Varchar>,
        content -> Text,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(evaluations -> controls (control_id));
diesel::joinable!(evidence -> evaluations (evaluation_id));
diesel::joinable!(comments -> evaluations (evaluation_id));
