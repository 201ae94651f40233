pub mod achievements;
pub mod dashboard;
pub mod domain;
pub mod grading;
pub mod ports;
pub mod progress;

pub use achievements::AchievementKind;
pub use domain::{
    AccountStatus, Achievement, Activity, ActivityKind, Assignment, AssignmentGrade, AuditLog,
    Course, CourseUpdate, DisciplinaryRecord, Enrollment, Grade, GradeStatus, Lesson,
    LessonProgress, NewActivity, NewAssignment, NewCourse, NewDisciplinaryRecord, NewLesson,
    NewNotification, NewQuiz, NewResource, NewUser, Notification, PlatformCounts, Progress,
    Question, Quiz, QuizCompletion, Resource, Role, Submission, User, UserCredentials, UserUpdate,
};
pub use grading::{
    check_quiz_definition, grade_submission, GradeOutcome, QuizDefinitionError, DEFAULT_PASSING_SCORE,
};
pub use ports::{
    AdminStore, CourseStore, DatabaseService, EngagementStore, EnrollmentStore, LessonMarked,
    PortError, PortResult, ProgressStore, QuizAttempt, QuizStore, RecordedAttempt, UserStore,
};
