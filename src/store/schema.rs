diesel::table! {
    users (id) {
        id -> Text,
        username -> Text,
        password_hash -> Text,
    }
}

diesel::table! {
    objects (id) {
        id -> Text,
        name -> Text,
        description -> Text,
        kind -> Text,
        attributes -> Text,
        tables -> Text,
        created_at -> BigInt,
        modified_at -> BigInt,
        revision -> Integer,
    }
}

diesel::table! {
    relations (id) {
        id -> Text,
        primary_object_id -> Text,
        relation_type -> Text,
        description -> Nullable<Text>,
    }
}

diesel::table! {
    relation_links (id) {
        id -> Integer,
        relation_id -> Text,
        object_id -> Text,
        position -> Integer,
    }
}

diesel::table! {
    hierarchies (id) {
        id -> Text,
        parent_object_id -> Nullable<Text>,
        child_object_ids -> Text,
        level -> Integer,
        properties -> Text,
    }
}

diesel::table! {
    object_types (id) {
        id -> Integer,
        object_type -> Text,
        parent_id -> Nullable<Integer>,
        description -> Nullable<Text>,
        attributes -> Text,
        tables -> Text,
    }
}

diesel::table! {
    relation_types (id) {
        id -> Integer,
        name -> Text,
        primary_type -> Integer,
        secondary_type -> Integer,
    }
}

diesel::table! {
    hierarchy_types (id) {
        id -> Integer,
        object_type -> Integer,
        inventory -> Text,
        purchase -> Text,
    }
}

diesel::table! {
    chat_sessions (id) {
        id -> Text,
        messages -> Text,
        created_at -> BigInt,
    }
}
