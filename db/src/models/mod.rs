pub mod attendance;
pub mod attendance_session;
pub mod attendance_summary;
pub mod class;
pub mod class_student;
pub mod user;

pub use attendance::Entity as Attendance;
pub use attendance_session::Entity as AttendanceSession;
pub use attendance_summary::Entity as AttendanceSummary;
pub use class::Entity as Class;
pub use class_student::Entity as ClassStudent;
pub use user::Entity as User;
