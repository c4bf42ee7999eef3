//! SQL schema for the DareX SQLite store.
//!
//! Column names are camelCase because rows are the JSON wire contract.
//! Executed once at connection startup; `PRAGMA user_version` gates future
//! migrations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    walletAddress  TEXT    NOT NULL UNIQUE,
    username       TEXT,
    bio            TEXT,
    avatar         TEXT,
    daresCompleted INTEGER NOT NULL DEFAULT 0,
    daresCreated   INTEGER NOT NULL DEFAULT 0,
    totalEarned    REAL    NOT NULL DEFAULT 0,
    votingAccuracy INTEGER NOT NULL DEFAULT 0,
    currentStreak  INTEGER NOT NULL DEFAULT 0,
    longestStreak  INTEGER NOT NULL DEFAULT 0,
    createdAt      TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS dares (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    title         TEXT    NOT NULL,
    description   TEXT    NOT NULL,
    reward        REAL    NOT NULL,
    creator       TEXT    NOT NULL,   -- wallet address
    deadline      TEXT    NOT NULL,   -- '<n> days|weeks|months' or RFC 3339
    difficulty    TEXT,
    category      TEXT,
    location      TEXT,
    featured      INTEGER NOT NULL DEFAULT 0,
    status        TEXT    NOT NULL DEFAULT 'open',
    participants  INTEGER NOT NULL DEFAULT 0,
    likes         INTEGER NOT NULL DEFAULT 0,
    comments      INTEGER NOT NULL DEFAULT 0,
    createdAt     TEXT    NOT NULL,
    chainDareId   INTEGER UNIQUE,     -- escrow contract id, if linked
    winner        TEXT,
    rewardClaimed INTEGER NOT NULL DEFAULT 0,
    completedAt   TEXT
);

-- One row per accepted (user, dare) pair.
CREATE TABLE IF NOT EXISTS user_dares (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    userId     INTEGER NOT NULL REFERENCES users(id),
    dareId     INTEGER NOT NULL REFERENCES dares(id),
    acceptedAt TEXT    NOT NULL,
    UNIQUE (userId, dareId)
);

CREATE TABLE IF NOT EXISTS submissions (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    dareId      INTEGER NOT NULL REFERENCES dares(id),
    userId      INTEGER NOT NULL REFERENCES users(id),
    description TEXT    NOT NULL,
    fileCID     TEXT    NOT NULL,
    status      TEXT    NOT NULL DEFAULT 'pending',
    createdAt   TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS votes (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    submissionId INTEGER NOT NULL REFERENCES submissions(id),
    userId       INTEGER NOT NULL REFERENCES users(id),
    vote         TEXT    NOT NULL CHECK (vote IN ('yes', 'no')),
    createdAt    TEXT    NOT NULL,
    UNIQUE (submissionId, userId)
);

CREATE TABLE IF NOT EXISTS dare_likes (
    id     INTEGER PRIMARY KEY AUTOINCREMENT,
    userId INTEGER NOT NULL REFERENCES users(id),
    dareId INTEGER NOT NULL REFERENCES dares(id),
    UNIQUE (userId, dareId)
);

CREATE TABLE IF NOT EXISTS dare_comments (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    dareId     INTEGER NOT NULL REFERENCES dares(id),
    userId     INTEGER NOT NULL REFERENCES users(id),
    comment    TEXT    NOT NULL,
    replyingTo INTEGER REFERENCES dare_comments(id),
    likes      INTEGER NOT NULL DEFAULT 0,
    createdAt  TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS dare_comment_likes (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    userId    INTEGER NOT NULL REFERENCES users(id),
    commentId INTEGER NOT NULL REFERENCES dare_comments(id),
    UNIQUE (userId, commentId)
);

CREATE TABLE IF NOT EXISTS notifications (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    userId    INTEGER NOT NULL REFERENCES users(id),
    type      TEXT    NOT NULL,
    message   TEXT    NOT NULL,
    isRead    INTEGER NOT NULL DEFAULT 0,
    createdAt TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS user_notification_settings (
    userId           INTEGER PRIMARY KEY REFERENCES users(id),
    dareUpdates      INTEGER NOT NULL DEFAULT 1,
    comments         INTEGER NOT NULL DEFAULT 1,
    submissionStatus INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS dares_status_idx        ON dares(status);
CREATE INDEX IF NOT EXISTS submissions_dare_idx    ON submissions(dareId);
CREATE INDEX IF NOT EXISTS votes_submission_idx    ON votes(submissionId);
CREATE INDEX IF NOT EXISTS comments_dare_idx       ON dare_comments(dareId);
CREATE INDEX IF NOT EXISTS notifications_user_idx  ON notifications(userId);

PRAGMA user_version = 1;
";
