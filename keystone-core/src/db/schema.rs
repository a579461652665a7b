pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    ledger_version INTEGER NOT NULL DEFAULT 0,
    waste_percent REAL NOT NULL DEFAULT 10,
    markup_percent REAL NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chat_messages (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    role TEXT NOT NULL CHECK (role IN ('user', 'assistant', 'system')),
    content TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS citations (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    seq INTEGER NOT NULL,
    cite_type TEXT NOT NULL,
    question_key TEXT NOT NULL,
    answer TEXT NOT NULL,
    value TEXT NOT NULL,
    metadata TEXT NOT NULL,
    message_id TEXT,
    created_at TEXT NOT NULL,
    superseded_at TEXT,
    UNIQUE (project_id, seq)
);

CREATE TABLE IF NOT EXISTS template_items (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    category TEXT NOT NULL CHECK (category IN ('material', 'labor')),
    base_quantity REAL NOT NULL,
    quantity REAL NOT NULL,
    unit TEXT NOT NULL,
    unit_price REAL NOT NULL,
    total_price REAL NOT NULL,
    apply_waste INTEGER NOT NULL DEFAULT 0,
    position INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS team_members (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    email TEXT NOT NULL,
    name TEXT,
    role TEXT NOT NULL CHECK (role IN ('owner', 'manager', 'foreman', 'worker', 'inspector')),
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'accepted', 'declined')),
    citation_id TEXT NOT NULL,
    invited_at TEXT NOT NULL,
    UNIQUE (project_id, email)
);

CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    kind TEXT NOT NULL CHECK (kind IN ('blueprint', 'site_photo', 'contract', 'template_snapshot')),
    file_name TEXT NOT NULL,
    storage_path TEXT NOT NULL,
    size_bytes INTEGER NOT NULL DEFAULT 0,
    citation_id TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_citations_project ON citations(project_id, seq);
CREATE INDEX IF NOT EXISTS idx_template_items_project ON template_items(project_id, position);
CREATE INDEX IF NOT EXISTS idx_team_members_project ON team_members(project_id);
CREATE INDEX IF NOT EXISTS idx_documents_project ON documents(project_id);
CREATE INDEX IF NOT EXISTS idx_messages_project ON chat_messages(project_id, created_at);

-- Only one live citation per singleton type per project
CREATE UNIQUE INDEX IF NOT EXISTS idx_one_live_singleton
    ON citations(project_id, cite_type)
    WHERE superseded_at IS NULL
      AND cite_type NOT IN ('TEAM_MEMBER_INVITE', 'BLUEPRINT_UPLOAD', 'SITE_PHOTO', 'CONTRACT');
"#;
