/*!
# Capability Search

A password-gated web application for searching an organization's capability
directory, built in Rust.

## Overview

The directory lives in a multi-sheet spreadsheet maintained by hand: one
sheet per organizational domain, two banner rows above the headers, and a
handful of columns whose headers are blank or drift between revisions. This
application normalizes that workbook into a flat record set, lets employees
search it by keyword and browse it by domain, lets admins edit records
through a simple form, and shows aggregate counts in a dashboard.

## Architecture

The application follows a client-server architecture:

### Frontend Layer
- **Technologies**: HTML, CSS, vanilla JavaScript (fetch against the JSON API)
- **Key Components**:
  - Login form - Session-cookie authentication
  - Search page - Keyword search with domain and has-SME filters,
    results grouped by domain
  - Record editor - Field-level edits for admins
  - Dashboard - Records-per-domain and SME-coverage charts
  - Feedback form - Name, email, 1-5 rating, comments

### Backend Layer
- **Technologies**: Rust, axum
- **Core Components**:
  - Ingestion/Normalizer - Multi-sheet XLSX to flat capability records,
    fail-soft per sheet
  - Column Mapper - Explicit logical-field to header/position table for the
    current workbook revision
  - Search Engine - Case-insensitive substring filter over a configurable
    field set, no ranking
  - Record Store - JSON-file table with store-assigned row identifiers
  - View State Reducer - Pure state transitions per user interaction

### Data Persistence Layer
- JSON file storage under a `database/` directory
- Atomic table replacement (write temporary file, rename)
- Independent feedback table, decoupled from the record table

## Key Features

- Keyword search across skill, competency, keywords and capability group
- Domain and has-SME structural filters
- Wholesale re-ingestion from an uploaded workbook
- Field-level record edits (admin)
- CSV and XLSX export of the full set or a filtered subset
- Secondary contacts-file listing with required-column validation
- Per-domain and per-division dashboard charts
- Session-based authentication with a provisioned credential/role list

## Modules

- **record**: Capability record, division set, contact display defaulting
- **columns**: Column mapping configuration for the workbook revision
- **ingest**: Workbook ingestion and normalization, contacts-file parsing
- **search**: Keyword/structural filtering and domain grouping
- **store**: Record and feedback tables
- **login**: Credential list, sessions and authentication handlers
- **state**: View state reducer
- **export**: CSV/XLSX export
- **dashboard**: Aggregate counts and chart rendering
- **app**: Routing and handlers

## REST API Endpoints

- `/api/login`, `/api/logout` - Session management
- `/api/search` - Filtered, domain-grouped results
- `/api/records/{id}` - Read or update one record
- `/api/ingest` - Upload a workbook and replace the record set
- `/api/contacts` - Upload and render the secondary contacts file
- `/api/export` - Download the record set as CSV or XLSX
- `/api/feedback` - Submit or list feedback
- `/api/dashboard` - Aggregate counts, plus PNG charts
*/

// Re-export all modules so they appear in the documentation
pub mod columns;
pub mod dashboard;
pub mod export;
pub mod ingest;
pub mod login;
pub mod record;
pub mod search;
pub mod state;
pub mod store;

#[cfg(feature = "web")]
pub mod app;

/// Re-export everything from these modules to make it easier to use
pub use columns::*;
pub use record::*;
pub use search::*;
pub use state::*;
pub use store::*;
