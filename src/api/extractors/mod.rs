pub mod job_auth;
